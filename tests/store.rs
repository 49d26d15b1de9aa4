use mysql_operator::desired::{ChildKind, DesiredState, ObjectRef, ParentDescriptor};
use mysql_operator::store::{ApiOutcome, MemoryStore, Operation, ResourceStore};
use mysql_operator::{Error, MySQLSpec};

fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{reason} for test object"),
        reason: reason.to_string(),
        code,
    })
}

fn desired() -> DesiredState {
    let parent = ParentDescriptor::new(
        "db1",
        "ns1",
        "uid-db1",
        MySQLSpec::new("mysql:8", "app", "p@ss", "5Gi"),
    );
    DesiredState::build(&parent).unwrap()
}

#[test]
fn conflict_maps_to_already_exists() {
    let outcome = ApiOutcome::<()>::from_kube(Err(api_error(409, "AlreadyExists")));
    assert!(matches!(outcome, ApiOutcome::AlreadyExists));
}

#[test]
fn missing_maps_to_not_found() {
    let outcome = ApiOutcome::<()>::from_kube(Err(api_error(404, "NotFound")));
    assert!(matches!(outcome, ApiOutcome::NotFound));
}

#[test]
fn other_status_is_kept_as_error() {
    let outcome = ApiOutcome::<()>::from_kube(Err(api_error(403, "Forbidden")));
    match outcome {
        ApiOutcome::Other(Error::Kube(kube::Error::Api(e))) => assert_eq!(e.code, 403),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn success_passes_value_through() {
    let outcome = ApiOutcome::from_kube(Ok(7)).map(|v| v * 6);
    assert!(outcome.is_ok());
    assert!(matches!(outcome, ApiOutcome::Ok(42)));
}

#[tokio::test]
async fn create_twice_conflicts() {
    let store = MemoryStore::new();
    let secret = desired().object(ChildKind::Secret).unwrap().clone();

    assert!(store.create(&secret).await.is_ok());
    assert!(matches!(
        store.create(&secret).await,
        ApiOutcome::AlreadyExists
    ));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn same_name_in_other_kind_does_not_conflict() {
    let store = MemoryStore::new();
    let state = desired();

    let workload = state.object(ChildKind::Workload).unwrap();
    let service = state.object(ChildKind::Service).unwrap();
    assert_eq!(workload.name(), service.name());

    assert!(store.create(workload).await.is_ok());
    assert!(store.create(service).await.is_ok());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn replace_and_delete_need_an_existing_object() {
    let store = MemoryStore::new();
    let role = desired().object(ChildKind::AccessRole).unwrap().clone();

    assert!(matches!(store.replace(&role).await, ApiOutcome::NotFound));
    assert!(matches!(
        store.delete(&role.object_ref()).await,
        ApiOutcome::NotFound
    ));

    store.insert(role.clone());
    assert!(store.replace(&role).await.is_ok());
    assert!(store.delete(&role.object_ref()).await.is_ok());
    assert!(store.is_empty());
}

#[tokio::test]
async fn get_returns_stored_object() {
    let store = MemoryStore::new();
    let sa = desired().service_account().clone();
    store.insert(sa.clone());

    match store.get(&sa.object_ref()).await {
        ApiOutcome::Ok(found) => assert_eq!(found, sa),
        other => panic!("unexpected outcome: {other:?}"),
    }
    let elsewhere = ObjectRef::new(ChildKind::ServiceAccount, "mysql", Some("ns2"));
    assert!(matches!(store.get(&elsewhere).await, ApiOutcome::NotFound));
}

#[tokio::test]
async fn namespaced_kind_without_namespace_is_rejected() {
    let store = MemoryStore::new();
    let target = ObjectRef::new(ChildKind::Secret, "db1-secret", None);

    match store.delete(&target).await {
        ApiOutcome::Other(Error::MissingField(field)) => {
            assert_eq!(field, "metadata.namespace")
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn injected_failures_apply_until_cleared() {
    let store = MemoryStore::new();
    let secret = desired().object(ChildKind::Secret).unwrap().clone();
    store.fail(Operation::Create, ChildKind::Secret, "boom");

    match store.create(&secret).await {
        ApiOutcome::Other(e) => assert_eq!(e.to_string(), "boom"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(store.is_empty());
    assert_eq!(store.calls(Operation::Create), 1);

    store.clear_failures();
    assert!(store.create(&secret).await.is_ok());
    assert_eq!(store.journal().len(), 2);
}
