//! Create and delete paths for one `MySQL` parent.
//!
//! Both paths walk a fixed step table. A step that hits the expected
//! conflict (create) or absence (delete) counts as done; any other failure
//! stops the pass and is returned so the dispatcher retries from the top.

use crate::desired::{ChildKind, DesiredState, ObjectRef, ParentDescriptor};
use crate::error::{Error, Result};
use crate::store::{ApiOutcome, ChildObject, ResourceStore};
use std::sync::Arc;
use tracing::{debug, info};

/// What a create step does when its object already exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Overwrite the live object with the desired one.
    Replace,
    /// Leave the live object untouched.
    Skip,
    /// Look the object up first and create it only when absent.
    EnsureExists,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateStep {
    pub kind: ChildKind,
    pub policy: ConflictPolicy,
}

const fn step(kind: ChildKind, policy: ConflictPolicy) -> CreateStep {
    CreateStep { kind, policy }
}

// The secret and claim precede the workload that references them.
pub const CREATE_STEPS: [CreateStep; 7] = [
    step(ChildKind::Secret, ConflictPolicy::Replace),
    step(ChildKind::VolumeClaim, ConflictPolicy::Skip),
    step(ChildKind::ServiceAccount, ConflictPolicy::EnsureExists),
    step(ChildKind::Workload, ConflictPolicy::Skip),
    step(ChildKind::Service, ConflictPolicy::Skip),
    step(ChildKind::AccessRole, ConflictPolicy::Replace),
    step(ChildKind::AccessRoleBinding, ConflictPolicy::Replace),
];

pub const DELETE_STEPS: [ChildKind; 6] = [
    ChildKind::Workload,
    ChildKind::Service,
    ChildKind::VolumeClaim,
    ChildKind::Secret,
    ChildKind::AccessRole,
    ChildKind::AccessRoleBinding,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Created,
    Replaced,
    Unchanged,
    Deleted,
    Absent,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub steps: Vec<(ObjectRef, StepOutcome)>,
}

impl ReconcileReport {
    pub fn count(&self, outcome: StepOutcome) -> usize {
        self.steps.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn outcome(&self, target: &ObjectRef) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|(t, _)| t == target)
            .map(|(_, o)| *o)
    }

    fn push(&mut self, target: ObjectRef, outcome: StepOutcome) {
        self.steps.push((target, outcome));
    }
}

#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn ResourceStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    pub async fn on_create(&self, parent: &ParentDescriptor) -> Result<ReconcileReport> {
        let desired = DesiredState::build(parent)?;
        let mut report = ReconcileReport::default();

        for step in CREATE_STEPS.iter() {
            let object = desired.object(step.kind).ok_or_else(|| {
                Error::Other(format!("no desired {} for {}", step.kind, parent.name))
            })?;
            let outcome = self.apply(step, object).await?;
            report.push(object.object_ref(), outcome);
        }

        info!(
            name = %parent.name,
            namespace = %parent.namespace,
            created = report.count(StepOutcome::Created),
            replaced = report.count(StepOutcome::Replaced),
            "Reconciled MySQL children"
        );
        Ok(report)
    }

    /// Deletion needs only the parent's identity, so an invalid spec never
    /// blocks cleanup.
    pub async fn on_delete(&self, parent: &ParentDescriptor) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        for kind in DELETE_STEPS {
            let target = kind.object_ref(parent);
            let outcome = match self.store.delete(&target).await {
                ApiOutcome::Ok(()) => {
                    info!(
                        kind = %kind,
                        name = %target.name,
                        namespace = ?target.namespace,
                        "Deleted"
                    );
                    StepOutcome::Deleted
                }
                ApiOutcome::NotFound => {
                    debug!(
                        kind = %kind,
                        name = %target.name,
                        namespace = ?target.namespace,
                        "Already gone"
                    );
                    StepOutcome::Absent
                }
                ApiOutcome::AlreadyExists => return Err(unexpected(&target, "delete")),
                ApiOutcome::Other(e) => return Err(e),
            };
            report.push(target, outcome);
        }

        info!(name = %parent.name, namespace = %parent.namespace, "Removed MySQL children");
        Ok(report)
    }

    async fn apply(&self, step: &CreateStep, object: &ChildObject) -> Result<StepOutcome> {
        let target = object.object_ref();

        if step.policy == ConflictPolicy::EnsureExists {
            match self.store.get(&target).await {
                ApiOutcome::Ok(_) => {
                    debug!(kind = %step.kind, name = %target.name, "Present, leaving as is");
                    return Ok(StepOutcome::Unchanged);
                }
                ApiOutcome::NotFound => {}
                ApiOutcome::AlreadyExists => return Err(unexpected(&target, "get")),
                ApiOutcome::Other(e) => return Err(e),
            }
        }

        match self.store.create(object).await {
            ApiOutcome::Ok(_) => {
                info!(
                    kind = %step.kind,
                    name = %target.name,
                    namespace = ?target.namespace,
                    "Created"
                );
                Ok(StepOutcome::Created)
            }
            ApiOutcome::AlreadyExists => match step.policy {
                ConflictPolicy::Replace => self.replace(object, &target).await,
                ConflictPolicy::Skip | ConflictPolicy::EnsureExists => {
                    debug!(kind = %step.kind, name = %target.name, "Exists, skipping");
                    Ok(StepOutcome::Unchanged)
                }
            },
            // Creating into a namespace that does not exist.
            ApiOutcome::NotFound => Err(unexpected(&target, "create")),
            ApiOutcome::Other(e) => Err(e),
        }
    }

    async fn replace(&self, object: &ChildObject, target: &ObjectRef) -> Result<StepOutcome> {
        match self.store.replace(object).await {
            ApiOutcome::Ok(_) => {
                info!(
                    kind = %target.kind,
                    name = %target.name,
                    namespace = ?target.namespace,
                    "Replaced"
                );
                Ok(StepOutcome::Replaced)
            }
            ApiOutcome::NotFound => Err(Error::Other(format!(
                "{target} disappeared before it could be replaced"
            ))),
            ApiOutcome::AlreadyExists => Err(unexpected(target, "replace")),
            ApiOutcome::Other(e) => Err(e),
        }
    }
}

fn unexpected(target: &ObjectRef, operation: &str) -> Error {
    Error::Other(format!("unexpected {operation} response for {target}"))
}
