use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const API_GROUP: &str = "otus.homework";
pub const PLURAL: &str = "mysqls";

/// Desired state of one managed MySQL instance.
///
/// Every field is optional at the schema level so that an incomplete object
/// still reaches validation and is rejected with the offending field name.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "otus.homework",
    version = "v1",
    kind = "MySQL",
    plural = "mysqls",
    singular = "mysql",
    shortname = "mysql",
    namespaced
)]
pub struct MySQLSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Requested volume size in quantity syntax, e.g. `10Gi`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_size: Option<String>,
}

impl MySQLSpec {
    pub fn new(
        image: impl Into<String>,
        database: impl Into<String>,
        password: impl Into<String>,
        storage_size: impl Into<String>,
    ) -> Self {
        Self {
            image: Some(image.into()),
            database: Some(database.into()),
            password: Some(password.into()),
            storage_size: Some(storage_size.into()),
        }
    }
}
