use super::{object_meta, non_empty, Labels, Selector};
use crate::types::ChildResource;
use k8s_openapi::api::core::v1 as k8s;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
pub struct Secret {
    pub name: String,
    pub labels: Labels,
    pub type_: Option<String>,
    pub string_data: BTreeMap<String, String>,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            type_: None,
            string_data: BTreeMap::new(),
        }
    }

    pub fn opaque(name: impl Into<String>) -> Self {
        Self::new(name).type_("Opaque")
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn type_(mut self, t: impl Into<String>) -> Self {
        self.type_ = Some(t.into());
        self
    }

    pub fn string_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.string_data.insert(key.into(), value.into());
        self
    }
}

impl ChildResource for Secret {
    type K8sType = k8s::Secret;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::Secret {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            type_: self.type_,
            string_data: if self.string_data.is_empty() {
                None
            } else {
                Some(self.string_data)
            },
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct Service {
    pub name: String,
    pub labels: Labels,
    pub selector: Selector,
    pub ports: Vec<ServicePort>,
    pub type_: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: name.clone(),
            labels: Labels::app(&name),
            selector: Selector::app(&name),
            ports: Vec::new(),
            type_: None,
        }
    }

    pub fn port_with_target(mut self, port: i32, target_port: i32) -> Self {
        self.ports.push(ServicePort { port, target_port });
        self
    }

    pub fn cluster_ip(mut self) -> Self {
        self.type_ = Some("ClusterIP".to_string());
        self
    }
}

impl ChildResource for Service {
    type K8sType = k8s::Service;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::Service {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            spec: Some(k8s::ServiceSpec {
                selector: Some(self.selector.into_inner()),
                ports: non_empty(self.ports.into_iter().map(|p| p.into_k8s()).collect()),
                type_: self.type_,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServicePort {
    pub port: i32,
    pub target_port: i32,
}

impl ServicePort {
    pub fn into_k8s(self) -> k8s::ServicePort {
        k8s::ServicePort {
            port: self.port,
            target_port: Some(IntOrString::Int(self.target_port)),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServiceAccount {
    pub name: String,
    pub labels: Labels,
}

impl ServiceAccount {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
        }
    }
}

impl ChildResource for ServiceAccount {
    type K8sType = k8s::ServiceAccount;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        k8s::ServiceAccount {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            ..Default::default()
        }
    }
}
