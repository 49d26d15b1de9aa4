//! Access to child objects in the control plane.
//!
//! Every call returns an [`ApiOutcome`] so callers match on conflict and
//! absence directly instead of inspecting status codes.

mod cluster;
#[cfg(any(test, feature = "test-util"))]
mod memory;

pub use cluster::KubeStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::{Call, MemoryStore, Operation};

pub use crate::desired::{ChildKind, ChildObject, ObjectRef};

use crate::error::Error;
use async_trait::async_trait;

#[derive(Debug)]
pub enum ApiOutcome<T> {
    Ok(T),
    AlreadyExists,
    NotFound,
    Other(Error),
}

impl<T> ApiOutcome<T> {
    pub fn from_kube(result: std::result::Result<T, kube::Error>) -> Self {
        match result {
            Ok(value) => ApiOutcome::Ok(value),
            Err(kube::Error::Api(e)) if e.code == 409 => ApiOutcome::AlreadyExists,
            Err(kube::Error::Api(e)) if e.code == 404 => ApiOutcome::NotFound,
            Err(e) => ApiOutcome::Other(Error::Kube(e)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            ApiOutcome::Ok(value) => ApiOutcome::Ok(f(value)),
            ApiOutcome::AlreadyExists => ApiOutcome::AlreadyExists,
            ApiOutcome::NotFound => ApiOutcome::NotFound,
            ApiOutcome::Other(e) => ApiOutcome::Other(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApiOutcome::Ok(_))
    }
}

impl<T> From<Error> for ApiOutcome<T> {
    fn from(error: Error) -> Self {
        ApiOutcome::Other(error)
    }
}

/// Object API over the control plane, per child kind.
///
/// Namespaced kinds take their namespace from the object or reference;
/// cluster-scoped kinds carry none.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn get(&self, target: &ObjectRef) -> ApiOutcome<ChildObject>;

    /// Fails with `AlreadyExists` when an object of that kind and name exists.
    async fn create(&self, object: &ChildObject) -> ApiOutcome<ChildObject>;

    async fn replace(&self, object: &ChildObject) -> ApiOutcome<ChildObject>;

    /// Fails with `NotFound` when nothing exists under that name.
    async fn delete(&self, target: &ObjectRef) -> ApiOutcome<()>;
}
