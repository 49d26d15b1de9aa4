use k8s_openapi::api::core::v1 as k8s;

/// Pod volume backed by a persistent volume claim.
#[derive(Clone, Debug)]
pub struct Volume {
    pub name: String,
    pub claim_name: String,
}

impl Volume {
    pub fn pvc(name: impl Into<String>, claim_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            claim_name: claim_name.into(),
        }
    }

    pub fn into_k8s(self) -> k8s::Volume {
        k8s::Volume {
            name: self.name,
            persistent_volume_claim: Some(k8s::PersistentVolumeClaimVolumeSource {
                claim_name: self.claim_name,
                read_only: None,
            }),
            ..Default::default()
        }
    }
}
