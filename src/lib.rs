pub mod backoff;
pub mod config;
pub mod crd;
pub mod desired;
pub mod error;
pub mod operator;
pub mod owner;
pub mod reconciler;
pub mod store;
pub mod types;

pub use backoff::ErrorBackoff;
pub use config::OperatorConfig;
pub use crd::{MySQL, MySQLSpec};
pub use desired::{ChildKind, ChildObject, DesiredState, ObjectRef, ParentDescriptor};
pub use error::{Error, Result};
pub use operator::Operator;
pub use reconciler::{Reconciler, ReconcileReport, StepOutcome};
pub use store::{ApiOutcome, KubeStore, ResourceStore};
#[cfg(any(test, feature = "test-util"))]
pub use store::MemoryStore;

pub mod prelude {
    pub use crate::config::OperatorConfig;
    pub use crate::crd::{MySQL, MySQLSpec};
    pub use crate::desired::{ChildKind, ChildObject, DesiredState, ObjectRef, ParentDescriptor};
    pub use crate::error::{Error, Result};
    pub use crate::operator::Operator;
    pub use crate::reconciler::{Reconciler, ReconcileReport, StepOutcome};
    pub use crate::store::{ApiOutcome, ResourceStore};

    pub use std::sync::Arc;
    pub use std::time::Duration;
}
