use super::{ApiOutcome, ChildKind, ChildObject, ObjectRef, ResourceStore};
use crate::error::Error;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    Get,
    Create,
    Replace,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub operation: Operation,
    pub target: ObjectRef,
}

#[derive(Default)]
struct Inner {
    objects: BTreeMap<ObjectRef, ChildObject>,
    journal: Vec<Call>,
    failures: BTreeMap<(Operation, ChildKind), String>,
}

impl Inner {
    fn record(&mut self, operation: Operation, target: &ObjectRef) -> Option<Error> {
        self.journal.push(Call {
            operation,
            target: target.clone(),
        });
        self.failures
            .get(&(operation, target.kind))
            .map(|message| Error::Other(message.clone()))
    }
}

/// In-process [`ResourceStore`] with API-server conflict semantics.
///
/// Every call is journaled, and failures can be injected per operation and
/// kind until cleared.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, object: ChildObject) {
        self.inner.lock().objects.insert(object.object_ref(), object);
    }

    pub fn fail(&self, operation: Operation, kind: ChildKind, message: impl Into<String>) {
        self.inner
            .lock()
            .failures
            .insert((operation, kind), message.into());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().failures.clear();
    }

    pub fn object(&self, target: &ObjectRef) -> Option<ChildObject> {
        self.inner.lock().objects.get(target).cloned()
    }

    pub fn contains(&self, target: &ObjectRef) -> bool {
        self.inner.lock().objects.contains_key(target)
    }

    pub fn objects(&self) -> Vec<ChildObject> {
        self.inner.lock().objects.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().objects.is_empty()
    }

    pub fn journal(&self) -> Vec<Call> {
        self.inner.lock().journal.clone()
    }

    pub fn calls(&self, operation: Operation) -> usize {
        self.inner
            .lock()
            .journal
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_journal(&self) {
        self.inner.lock().journal.clear();
    }
}

fn check_scope(target: &ObjectRef) -> Option<Error> {
    if !target.kind.is_cluster_scoped() && target.namespace.is_none() {
        Some(Error::MissingField("metadata.namespace"))
    } else {
        None
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get(&self, target: &ObjectRef) -> ApiOutcome<ChildObject> {
        let mut inner = self.inner.lock();
        let failure = inner.record(Operation::Get, target);
        if let Some(e) = failure.or_else(|| check_scope(target)) {
            return e.into();
        }
        match inner.objects.get(target) {
            Some(object) => ApiOutcome::Ok(object.clone()),
            None => ApiOutcome::NotFound,
        }
    }

    async fn create(&self, object: &ChildObject) -> ApiOutcome<ChildObject> {
        let target = object.object_ref();
        let mut inner = self.inner.lock();
        let failure = inner.record(Operation::Create, &target);
        if let Some(e) = failure.or_else(|| check_scope(&target)) {
            return e.into();
        }
        if inner.objects.contains_key(&target) {
            return ApiOutcome::AlreadyExists;
        }
        inner.objects.insert(target, object.clone());
        ApiOutcome::Ok(object.clone())
    }

    async fn replace(&self, object: &ChildObject) -> ApiOutcome<ChildObject> {
        let target = object.object_ref();
        let mut inner = self.inner.lock();
        let failure = inner.record(Operation::Replace, &target);
        if let Some(e) = failure.or_else(|| check_scope(&target)) {
            return e.into();
        }
        match inner.objects.get_mut(&target) {
            Some(existing) => {
                *existing = object.clone();
                ApiOutcome::Ok(object.clone())
            }
            None => ApiOutcome::NotFound,
        }
    }

    async fn delete(&self, target: &ObjectRef) -> ApiOutcome<()> {
        let mut inner = self.inner.lock();
        let failure = inner.record(Operation::Delete, target);
        if let Some(e) = failure.or_else(|| check_scope(target)) {
            return e.into();
        }
        match inner.objects.remove(target) {
            Some(_) => ApiOutcome::Ok(()),
            None => ApiOutcome::NotFound,
        }
    }
}
