use super::{ApiOutcome, ChildKind, ChildObject, ObjectRef, ResourceStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::api::rbac::v1 as rbac;
use kube::api::{Api, DeleteParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Resolves the `Api` handle for a kind given its scope.
trait ScopedApi:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync
{
    fn scoped_api(client: Client, namespace: Option<&str>) -> Result<Api<Self>>;
}

macro_rules! namespaced {
    ($($ty:ty),*) => {$(
        impl ScopedApi for $ty {
            fn scoped_api(client: Client, namespace: Option<&str>) -> Result<Api<Self>> {
                let namespace = namespace.ok_or(Error::MissingField("metadata.namespace"))?;
                Ok(Api::namespaced(client, namespace))
            }
        }
    )*};
}

macro_rules! cluster_scoped {
    ($($ty:ty),*) => {$(
        impl ScopedApi for $ty {
            fn scoped_api(client: Client, _namespace: Option<&str>) -> Result<Api<Self>> {
                Ok(Api::all(client))
            }
        }
    )*};
}

namespaced!(
    core::Secret,
    core::PersistentVolumeClaim,
    core::ServiceAccount,
    core::Service,
    apps::Deployment
);
cluster_scoped!(rbac::ClusterRole, rbac::ClusterRoleBinding);

/// [`ResourceStore`] backed by the Kubernetes API server.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl KubeStore {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    fn api<K: ScopedApi>(&self, namespace: Option<&str>) -> Result<Api<K>> {
        K::scoped_api(self.client.clone(), namespace)
    }

    async fn get_as<K: ScopedApi>(&self, target: &ObjectRef) -> ApiOutcome<K> {
        match self.api::<K>(target.namespace.as_deref()) {
            Ok(api) => ApiOutcome::from_kube(api.get(&target.name).await),
            Err(e) => e.into(),
        }
    }

    async fn create_as<K: ScopedApi>(&self, object: &K) -> ApiOutcome<K> {
        match self.api::<K>(object.meta().namespace.as_deref()) {
            Ok(api) => ApiOutcome::from_kube(api.create(&self.post_params(), object).await),
            Err(e) => e.into(),
        }
    }

    async fn replace_as<K: ScopedApi>(&self, object: &K) -> ApiOutcome<K> {
        let name = object.name_any();
        match self.api::<K>(object.meta().namespace.as_deref()) {
            Ok(api) => {
                ApiOutcome::from_kube(api.replace(&name, &self.post_params(), object).await)
            }
            Err(e) => e.into(),
        }
    }

    async fn delete_as<K: ScopedApi>(&self, target: &ObjectRef) -> ApiOutcome<()> {
        match self.api::<K>(target.namespace.as_deref()) {
            Ok(api) => ApiOutcome::from_kube(
                api.delete(&target.name, &DeleteParams::default())
                    .await
                    .map(|_| ()),
            ),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get(&self, target: &ObjectRef) -> ApiOutcome<ChildObject> {
        match target.kind {
            ChildKind::Secret => self
                .get_as::<core::Secret>(target)
                .await
                .map(ChildObject::Secret),
            ChildKind::VolumeClaim => self
                .get_as::<core::PersistentVolumeClaim>(target)
                .await
                .map(ChildObject::VolumeClaim),
            ChildKind::ServiceAccount => self
                .get_as::<core::ServiceAccount>(target)
                .await
                .map(ChildObject::ServiceAccount),
            ChildKind::Workload => self
                .get_as::<apps::Deployment>(target)
                .await
                .map(ChildObject::Workload),
            ChildKind::Service => self
                .get_as::<core::Service>(target)
                .await
                .map(ChildObject::Service),
            ChildKind::AccessRole => self
                .get_as::<rbac::ClusterRole>(target)
                .await
                .map(ChildObject::AccessRole),
            ChildKind::AccessRoleBinding => self
                .get_as::<rbac::ClusterRoleBinding>(target)
                .await
                .map(ChildObject::AccessRoleBinding),
        }
    }

    async fn create(&self, object: &ChildObject) -> ApiOutcome<ChildObject> {
        match object {
            ChildObject::Secret(o) => self.create_as(o).await.map(ChildObject::Secret),
            ChildObject::VolumeClaim(o) => self.create_as(o).await.map(ChildObject::VolumeClaim),
            ChildObject::ServiceAccount(o) => {
                self.create_as(o).await.map(ChildObject::ServiceAccount)
            }
            ChildObject::Workload(o) => self.create_as(o).await.map(ChildObject::Workload),
            ChildObject::Service(o) => self.create_as(o).await.map(ChildObject::Service),
            ChildObject::AccessRole(o) => self.create_as(o).await.map(ChildObject::AccessRole),
            ChildObject::AccessRoleBinding(o) => {
                self.create_as(o).await.map(ChildObject::AccessRoleBinding)
            }
        }
    }

    async fn replace(&self, object: &ChildObject) -> ApiOutcome<ChildObject> {
        match object {
            ChildObject::Secret(o) => self.replace_as(o).await.map(ChildObject::Secret),
            ChildObject::VolumeClaim(o) => self.replace_as(o).await.map(ChildObject::VolumeClaim),
            ChildObject::ServiceAccount(o) => {
                self.replace_as(o).await.map(ChildObject::ServiceAccount)
            }
            ChildObject::Workload(o) => self.replace_as(o).await.map(ChildObject::Workload),
            ChildObject::Service(o) => self.replace_as(o).await.map(ChildObject::Service),
            ChildObject::AccessRole(o) => self.replace_as(o).await.map(ChildObject::AccessRole),
            ChildObject::AccessRoleBinding(o) => {
                self.replace_as(o).await.map(ChildObject::AccessRoleBinding)
            }
        }
    }

    async fn delete(&self, target: &ObjectRef) -> ApiOutcome<()> {
        match target.kind {
            ChildKind::Secret => self.delete_as::<core::Secret>(target).await,
            ChildKind::VolumeClaim => self.delete_as::<core::PersistentVolumeClaim>(target).await,
            ChildKind::ServiceAccount => self.delete_as::<core::ServiceAccount>(target).await,
            ChildKind::Workload => self.delete_as::<apps::Deployment>(target).await,
            ChildKind::Service => self.delete_as::<core::Service>(target).await,
            ChildKind::AccessRole => self.delete_as::<rbac::ClusterRole>(target).await,
            ChildKind::AccessRoleBinding => {
                self.delete_as::<rbac::ClusterRoleBinding>(target).await
            }
        }
    }
}
