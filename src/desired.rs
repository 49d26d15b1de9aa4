//! Pure mapping from a `MySQL` parent to the child objects that realise it.

use crate::crd::{MySQL, MySQLSpec, API_GROUP, PLURAL};
use crate::error::{Error, Result};
use crate::owner::owner_reference_for;
use crate::types::{
    ChildResource, ClusterRole, ClusterRoleBinding, Container, Deployment, Labels,
    PersistentVolumeClaim, PolicyRule, Secret, Service, ServiceAccount, Volume,
};
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::api::rbac::v1 as rbac;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::ResourceExt;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const ROOT_PASSWORD_KEY: &str = "MYSQL_ROOT_PASSWORD";
pub const DATABASE_ENV: &str = "MYSQL_DATABASE";
pub const MYSQL_PORT: i32 = 3306;
pub const DATA_DIR: &str = "/var/lib/mysql";
pub const DATA_VOLUME: &str = "mysql-storage";
pub const CONTAINER_NAME: &str = "mysql";
pub const SERVICE_ACCOUNT: &str = "mysql";

const FULL_VERBS: [&str; 7] = ["get", "list", "watch", "create", "update", "patch", "delete"];
const STORAGE_VERBS: [&str; 7] = ["create", "delete", "get", "list", "watch", "update", "patch"];

// Kubernetes quantity: signed decimal number followed by a binary SI
// suffix, a decimal SI suffix or a decimal exponent.
static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[+-]?([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+|Ki|Mi|Gi|Ti|Pi|Ei|m|k|M|G|T|P|E)?$",
    )
    .expect("quantity pattern is valid")
});

pub fn secret_name(parent: &str) -> String {
    format!("{parent}-secret")
}

pub fn volume_claim_name(parent: &str) -> String {
    format!("{parent}-pvc")
}

pub fn workload_name(parent: &str) -> String {
    parent.to_string()
}

pub fn service_name(parent: &str) -> String {
    parent.to_string()
}

// Cluster-scoped and not namespace-qualified: equally named parents in two
// namespaces share these objects.
pub fn role_name(parent: &str) -> String {
    parent.to_string()
}

pub fn role_binding_name(parent: &str) -> String {
    parent.to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChildKind {
    Secret,
    VolumeClaim,
    ServiceAccount,
    Workload,
    Service,
    AccessRole,
    AccessRoleBinding,
}

impl ChildKind {
    pub fn is_cluster_scoped(self) -> bool {
        matches!(self, ChildKind::AccessRole | ChildKind::AccessRoleBinding)
    }

    /// Kubernetes kind name of the object this child is rendered as.
    pub fn as_str(self) -> &'static str {
        match self {
            ChildKind::Secret => "Secret",
            ChildKind::VolumeClaim => "PersistentVolumeClaim",
            ChildKind::ServiceAccount => "ServiceAccount",
            ChildKind::Workload => "Deployment",
            ChildKind::Service => "Service",
            ChildKind::AccessRole => "ClusterRole",
            ChildKind::AccessRoleBinding => "ClusterRoleBinding",
        }
    }

    pub fn child_name(self, parent: &str) -> String {
        match self {
            ChildKind::Secret => secret_name(parent),
            ChildKind::VolumeClaim => volume_claim_name(parent),
            ChildKind::ServiceAccount => SERVICE_ACCOUNT.to_string(),
            ChildKind::Workload => workload_name(parent),
            ChildKind::Service => service_name(parent),
            ChildKind::AccessRole => role_name(parent),
            ChildKind::AccessRoleBinding => role_binding_name(parent),
        }
    }

    pub fn object_ref(self, parent: &ParentDescriptor) -> ObjectRef {
        ObjectRef {
            kind: self,
            name: self.child_name(&parent.name),
            namespace: if self.is_cluster_scoped() {
                None
            } else {
                Some(parent.namespace.clone())
            },
        }
    }
}

impl fmt::Display for ChildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of a child object in the control plane.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub kind: ChildKind,
    pub name: String,
    pub namespace: Option<String>,
}

impl ObjectRef {
    pub fn new(kind: ChildKind, name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.map(str::to_string),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind, ns, self.name),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

/// A rendered child object, tagged by kind.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildObject {
    Secret(core::Secret),
    VolumeClaim(core::PersistentVolumeClaim),
    ServiceAccount(core::ServiceAccount),
    Workload(apps::Deployment),
    Service(core::Service),
    AccessRole(rbac::ClusterRole),
    AccessRoleBinding(rbac::ClusterRoleBinding),
}

impl ChildObject {
    pub fn kind(&self) -> ChildKind {
        match self {
            ChildObject::Secret(_) => ChildKind::Secret,
            ChildObject::VolumeClaim(_) => ChildKind::VolumeClaim,
            ChildObject::ServiceAccount(_) => ChildKind::ServiceAccount,
            ChildObject::Workload(_) => ChildKind::Workload,
            ChildObject::Service(_) => ChildKind::Service,
            ChildObject::AccessRole(_) => ChildKind::AccessRole,
            ChildObject::AccessRoleBinding(_) => ChildKind::AccessRoleBinding,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            ChildObject::Secret(o) => &o.metadata,
            ChildObject::VolumeClaim(o) => &o.metadata,
            ChildObject::ServiceAccount(o) => &o.metadata,
            ChildObject::Workload(o) => &o.metadata,
            ChildObject::Service(o) => &o.metadata,
            ChildObject::AccessRole(o) => &o.metadata,
            ChildObject::AccessRoleBinding(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.meta().namespace.as_deref()
    }

    pub fn owner_references(&self) -> &[OwnerReference] {
        self.meta().owner_references.as_deref().unwrap_or_default()
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind(), self.name(), self.namespace())
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        let value = match self {
            ChildObject::Secret(o) => serde_json::to_value(o)?,
            ChildObject::VolumeClaim(o) => serde_json::to_value(o)?,
            ChildObject::ServiceAccount(o) => serde_json::to_value(o)?,
            ChildObject::Workload(o) => serde_json::to_value(o)?,
            ChildObject::Service(o) => serde_json::to_value(o)?,
            ChildObject::AccessRole(o) => serde_json::to_value(o)?,
            ChildObject::AccessRoleBinding(o) => serde_json::to_value(o)?,
        };
        Ok(value)
    }
}

/// Identity and spec of a parent, fixed for one reconciliation pass.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentDescriptor {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub spec: MySQLSpec,
}

impl ParentDescriptor {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        uid: impl Into<String>,
        spec: MySQLSpec,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: uid.into(),
            spec,
        }
    }

    pub fn from_resource(resource: &MySQL) -> Result<Self> {
        let name = resource
            .metadata
            .name
            .clone()
            .ok_or(Error::MissingField("metadata.name"))?;
        let namespace = resource
            .namespace()
            .ok_or(Error::MissingField("metadata.namespace"))?;
        let uid = resource.uid().ok_or(Error::MissingField("metadata.uid"))?;
        Ok(Self::new(name, namespace, uid, resource.spec.clone()))
    }

    pub fn validate(&self) -> Result<ValidatedSpec> {
        let image = required("image", &self.spec.image)?;
        let database = required("database", &self.spec.database)?;
        let password = required("password", &self.spec.password)?;
        let storage_size = required("storage_size", &self.spec.storage_size)?;
        if !QUANTITY_REGEX.is_match(&storage_size) {
            return Err(Error::validation(
                "storage_size",
                format!("'{storage_size}' is not a valid quantity"),
            ));
        }
        if storage_size.starts_with('-') {
            return Err(Error::validation(
                "storage_size",
                format!("'{storage_size}' must not be negative"),
            ));
        }
        Ok(ValidatedSpec {
            image,
            database,
            password,
            storage_size,
        })
    }
}

fn required(field: &'static str, value: &Option<String>) -> Result<String> {
    match value {
        None => Err(Error::validation(field, "is required")),
        Some(v) if v.trim().is_empty() => Err(Error::validation(field, "must not be empty")),
        Some(v) => Ok(v.clone()),
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedSpec {
    pub image: String,
    pub database: String,
    pub password: String,
    pub storage_size: String,
}

impl fmt::Debug for ValidatedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedSpec")
            .field("image", &self.image)
            .field("database", &self.database)
            .field("password", &"<redacted>")
            .field("storage_size", &self.storage_size)
            .finish()
    }
}

/// Full set of child objects for one parent.
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredState {
    children: Vec<ChildObject>,
    service_account: ChildObject,
}

impl DesiredState {
    pub fn build(parent: &ParentDescriptor) -> Result<Self> {
        let spec = parent.validate()?;
        let name = parent.name.as_str();
        let namespace = Some(parent.namespace.as_str());
        let owner = |kind| owner_reference_for(kind, parent);

        let secret = Secret::opaque(secret_name(name))
            .labels(Labels::app(name))
            .string_data(ROOT_PASSWORD_KEY, &spec.password)
            .into_k8s(namespace, owner(ChildKind::Secret));

        let claim = PersistentVolumeClaim::new(volume_claim_name(name), &spec.storage_size)
            .labels(Labels::app(name))
            .into_k8s(namespace, owner(ChildKind::VolumeClaim));

        let container = Container::new(CONTAINER_NAME, &spec.image)
            .env_from_secret(ROOT_PASSWORD_KEY, secret_name(name), ROOT_PASSWORD_KEY)
            .env(DATABASE_ENV, &spec.database)
            .port(MYSQL_PORT)
            .volume_mount(DATA_VOLUME, DATA_DIR);
        let workload = Deployment::new(workload_name(name))
            .replicas(1)
            .container(container)
            .volume(Volume::pvc(DATA_VOLUME, volume_claim_name(name)))
            .into_k8s(namespace, owner(ChildKind::Workload));

        let service = Service::new(service_name(name))
            .cluster_ip()
            .port_with_target(MYSQL_PORT, MYSQL_PORT)
            .into_k8s(namespace, owner(ChildKind::Service));

        let role = ClusterRole::new(role_name(name))
            .labels(Labels::app(name))
            .rule(
                PolicyRule::new()
                    .api_group(API_GROUP)
                    .resources([PLURAL.to_string(), format!("{PLURAL}/status")])
                    .verbs(FULL_VERBS),
            )
            .rule(
                PolicyRule::new()
                    .core_api()
                    .resources(["services", "persistentvolumes", "persistentvolumeclaims"])
                    .verbs(STORAGE_VERBS),
            )
            .into_k8s(None, owner(ChildKind::AccessRole));

        let binding = ClusterRoleBinding::new(role_binding_name(name), role_name(name))
            .labels(Labels::app(name))
            .service_account(SERVICE_ACCOUNT, &parent.namespace)
            .into_k8s(None, owner(ChildKind::AccessRoleBinding));

        let service_account = ServiceAccount::new(SERVICE_ACCOUNT)
            .into_k8s(namespace, owner(ChildKind::ServiceAccount));

        Ok(Self {
            children: vec![
                ChildObject::Secret(secret),
                ChildObject::VolumeClaim(claim),
                ChildObject::Workload(workload),
                ChildObject::Service(service),
                ChildObject::AccessRole(role),
                ChildObject::AccessRoleBinding(binding),
            ],
            service_account: ChildObject::ServiceAccount(service_account),
        })
    }

    /// The six parent-specific children in creation order.
    pub fn children(&self) -> &[ChildObject] {
        &self.children
    }

    pub fn service_account(&self) -> &ChildObject {
        &self.service_account
    }

    pub fn object(&self, kind: ChildKind) -> Option<&ChildObject> {
        if kind == ChildKind::ServiceAccount {
            return Some(&self.service_account);
        }
        self.children.iter().find(|c| c.kind() == kind)
    }
}
