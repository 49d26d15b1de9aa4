use crate::crd::MySQL;
use crate::desired::{ChildKind, ParentDescriptor};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;

/// Controller reference from a child object back to its `MySQL` parent.
pub fn owner_reference(parent: &ParentDescriptor) -> OwnerReference {
    OwnerReference {
        api_version: MySQL::api_version(&()).to_string(),
        kind: MySQL::kind(&()).to_string(),
        name: parent.name.clone(),
        uid: parent.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Owner reference to attach to a child of `kind`.
///
/// Cluster-scoped children get none: the garbage collector does not cascade
/// from a namespaced owner to them, so the delete path removes them itself.
pub fn owner_reference_for(kind: ChildKind, parent: &ParentDescriptor) -> Option<OwnerReference> {
    if kind.is_cluster_scoped() {
        None
    } else {
        Some(owner_reference(parent))
    }
}
