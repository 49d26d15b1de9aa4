use super::non_empty;
use k8s_openapi::api::core::v1 as k8s;

#[derive(Clone, Debug)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub ports: Vec<ContainerPort>,
    pub env: Vec<EnvVar>,
    pub volume_mounts: Vec<VolumeMount>,
}

impl Container {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ports: Vec::new(),
            env: Vec::new(),
            volume_mounts: Vec::new(),
        }
    }

    pub fn port(mut self, port: i32) -> Self {
        self.ports.push(ContainerPort {
            container_port: port,
        });
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVar::Value {
            name: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn env_from_secret(
        mut self,
        name: impl Into<String>,
        secret_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        self.env.push(EnvVar::SecretRef {
            name: name.into(),
            secret_name: secret_name.into(),
            key: key.into(),
        });
        self
    }

    pub fn volume_mount(
        mut self,
        name: impl Into<String>,
        mount_path: impl Into<String>,
    ) -> Self {
        self.volume_mounts.push(VolumeMount {
            name: name.into(),
            mount_path: mount_path.into(),
        });
        self
    }

    pub fn into_k8s(self) -> k8s::Container {
        k8s::Container {
            name: self.name,
            image: Some(self.image),
            ports: non_empty(self.ports.into_iter().map(|p| p.into_k8s()).collect()),
            env: non_empty(self.env.into_iter().map(|e| e.into_k8s()).collect()),
            volume_mounts: non_empty(
                self.volume_mounts
                    .into_iter()
                    .map(|v| v.into_k8s())
                    .collect(),
            ),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug)]
pub struct ContainerPort {
    pub container_port: i32,
}

impl ContainerPort {
    pub fn into_k8s(self) -> k8s::ContainerPort {
        k8s::ContainerPort {
            container_port: self.container_port,
            ..Default::default()
        }
    }
}

/// Environment variable either inlined or sourced from a secret key.
#[derive(Clone, Debug)]
pub enum EnvVar {
    Value {
        name: String,
        value: String,
    },
    SecretRef {
        name: String,
        secret_name: String,
        key: String,
    },
}

impl EnvVar {
    pub fn into_k8s(self) -> k8s::EnvVar {
        match self {
            EnvVar::Value { name, value } => k8s::EnvVar {
                name,
                value: Some(value),
                value_from: None,
            },
            EnvVar::SecretRef {
                name,
                secret_name,
                key,
            } => k8s::EnvVar {
                name,
                value: None,
                value_from: Some(k8s::EnvVarSource {
                    secret_key_ref: Some(k8s::SecretKeySelector {
                        name: secret_name,
                        key,
                        optional: None,
                    }),
                    ..Default::default()
                }),
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
}

impl VolumeMount {
    pub fn into_k8s(self) -> k8s::VolumeMount {
        k8s::VolumeMount {
            name: self.name,
            mount_path: self.mount_path,
            ..Default::default()
        }
    }
}
