use super::{object_meta, non_empty, Labels};
use crate::types::ChildResource;
use k8s_openapi::api::rbac::v1 as k8s;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

#[derive(Clone, Debug)]
pub struct ClusterRole {
    pub name: String,
    pub labels: Labels,
    pub rules: Vec<PolicyRule>,
}

impl ClusterRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            rules: Vec::new(),
        }
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn rule(mut self, rule: PolicyRule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl ChildResource for ClusterRole {
    type K8sType = k8s::ClusterRole;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::ClusterRole {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            rules: non_empty(self.rules.into_iter().map(|r| r.into_k8s()).collect()),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClusterRoleBinding {
    pub name: String,
    pub labels: Labels,
    pub role_ref: RoleRef,
    pub subjects: Vec<Subject>,
}

impl ClusterRoleBinding {
    pub fn new(name: impl Into<String>, cluster_role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            role_ref: RoleRef {
                kind: "ClusterRole".to_string(),
                name: cluster_role.into(),
                api_group: RBAC_API_GROUP.to_string(),
            },
            subjects: Vec::new(),
        }
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn service_account(
        mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        self.subjects.push(Subject {
            kind: "ServiceAccount".to_string(),
            name: name.into(),
            namespace: Some(namespace.into()),
            api_group: None,
        });
        self
    }
}

impl ChildResource for ClusterRoleBinding {
    type K8sType = k8s::ClusterRoleBinding;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::ClusterRoleBinding {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            role_ref: self.role_ref.into_k8s(),
            subjects: non_empty(self.subjects.into_iter().map(|s| s.into_k8s()).collect()),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PolicyRule {
    pub api_groups: Vec<String>,
    pub resources: Vec<String>,
    pub verbs: Vec<String>,
}

impl PolicyRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_group(mut self, group: impl Into<String>) -> Self {
        self.api_groups.push(group.into());
        self
    }

    pub fn core_api(self) -> Self {
        self.api_group("")
    }

    pub fn resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn verbs<I, S>(mut self, verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verbs = verbs.into_iter().map(Into::into).collect();
        self
    }

    pub fn into_k8s(self) -> k8s::PolicyRule {
        k8s::PolicyRule {
            api_groups: non_empty(self.api_groups),
            resources: non_empty(self.resources),
            verbs: self.verbs,
            resource_names: None,
            non_resource_urls: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoleRef {
    pub kind: String,
    pub name: String,
    pub api_group: String,
}

impl RoleRef {
    pub fn into_k8s(self) -> k8s::RoleRef {
        k8s::RoleRef {
            kind: self.kind,
            name: self.name,
            api_group: self.api_group,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Subject {
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub api_group: Option<String>,
}

impl Subject {
    pub fn into_k8s(self) -> k8s::Subject {
        k8s::Subject {
            kind: self.kind,
            name: self.name,
            namespace: self.namespace,
            api_group: self.api_group,
        }
    }
}
