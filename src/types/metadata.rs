use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(pub BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn app(name: impl Into<String>) -> Self {
        Self::new().insert("app", name)
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }

    fn into_option(self) -> Option<BTreeMap<String, String>> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector(pub BTreeMap<String, String>);

impl Selector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn app(name: impl Into<String>) -> Self {
        Self::new().match_labels("app", name)
    }

    pub fn match_labels(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

pub(crate) fn object_meta(
    name: String,
    namespace: Option<&str>,
    labels: Labels,
    owner_ref: Option<OwnerReference>,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name),
        namespace: namespace.map(str::to_string),
        labels: labels.into_option(),
        owner_references: owner_ref.map(|r| vec![r]),
        ..Default::default()
    }
}
