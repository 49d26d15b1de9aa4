pub mod container;
pub mod core;
pub mod metadata;
pub mod rbac;
pub mod volume;
pub mod workloads;

pub use container::*;
pub use self::core::*;
pub use metadata::*;
pub use rbac::*;
pub use volume::*;
pub use workloads::*;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

/// A builder that renders into a concrete Kubernetes object.
///
/// `namespace` is `None` for cluster-scoped kinds.
pub trait ChildResource: Send + Sync {
    type K8sType: kube::Resource<DynamicType = ()>
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>)
        -> Self::K8sType;
}

pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
