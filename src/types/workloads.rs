use super::{non_empty, object_meta, Container, Labels, Selector, Volume};
use crate::types::ChildResource;
use k8s_openapi::api::apps::v1 as apps;
use k8s_openapi::api::core::v1 as core;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, OwnerReference};

#[derive(Clone, Debug)]
pub struct Deployment {
    pub name: String,
    pub replicas: i32,
    pub labels: Labels,
    pub selector: Selector,
    pub containers: Vec<Container>,
    pub volumes: Vec<Volume>,
}

impl Deployment {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name: name.clone(),
            replicas: 1,
            labels: Labels::app(&name),
            selector: Selector::app(&name),
            containers: Vec::new(),
            volumes: Vec::new(),
        }
    }

    pub fn replicas(mut self, n: i32) -> Self {
        self.replicas = n;
        self
    }

    pub fn container(mut self, container: Container) -> Self {
        self.containers.push(container);
        self
    }

    pub fn volume(mut self, volume: Volume) -> Self {
        self.volumes.push(volume);
        self
    }
}

impl ChildResource for Deployment {
    type K8sType = apps::Deployment;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        let template_labels = self.labels.clone().into_inner();
        apps::Deployment {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            spec: Some(apps::DeploymentSpec {
                replicas: Some(self.replicas),
                selector: LabelSelector {
                    match_labels: Some(self.selector.into_inner()),
                    match_expressions: None,
                },
                template: core::PodTemplateSpec {
                    metadata: Some(ObjectMeta {
                        labels: Some(template_labels),
                        ..Default::default()
                    }),
                    spec: Some(core::PodSpec {
                        containers: self.containers.into_iter().map(|c| c.into_k8s()).collect(),
                        volumes: non_empty(self.volumes.into_iter().map(|v| v.into_k8s()).collect()),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct PersistentVolumeClaim {
    pub name: String,
    pub labels: Labels,
    pub access_modes: Vec<String>,
    pub storage: String,
}

impl PersistentVolumeClaim {
    pub fn new(name: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            labels: Labels::new(),
            access_modes: vec!["ReadWriteOnce".to_string()],
            storage: storage.into(),
        }
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }
}

impl ChildResource for PersistentVolumeClaim {
    type K8sType = core::PersistentVolumeClaim;

    fn into_k8s(self, namespace: Option<&str>, owner_ref: Option<OwnerReference>) -> Self::K8sType {
        core::PersistentVolumeClaim {
            metadata: object_meta(self.name, namespace, self.labels, owner_ref),
            spec: Some(core::PersistentVolumeClaimSpec {
                access_modes: Some(self.access_modes),
                resources: Some(core::VolumeResourceRequirements {
                    requests: Some(
                        [("storage".to_string(), Quantity(self.storage))]
                            .into_iter()
                            .collect(),
                    ),
                    limits: None,
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}
