use crate::backoff::ErrorBackoff;
use crate::config::OperatorConfig;
use crate::crd::MySQL;
use crate::desired::ParentDescriptor;
use crate::error::{Error, Result};
use crate::reconciler::Reconciler;
use crate::store::{KubeStore, ResourceStore};
use futures::StreamExt;
use kube::api::{Api, Patch, PatchParams};
use kube::runtime::controller::{Action, Controller};
use kube::runtime::reflector::Store;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::{Client, Resource, ResourceExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Watches `MySQL` objects and dispatches create and delete passes to the
/// [`Reconciler`].
pub struct Operator {
    client: Client,
    config: OperatorConfig,
}

impl Operator {
    pub fn new(client: Client, config: OperatorConfig) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> Result<()> {
        self.config.validate()?;

        let api: Api<MySQL> = match &self.config.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        info!(
            group = %MySQL::group(&()),
            kind = %MySQL::kind(&()),
            namespace = self.config.namespace.as_deref().unwrap_or("all"),
            "Starting operator"
        );

        let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(
            self.client.clone(),
            self.config.field_manager.clone(),
        ));
        let controller = Controller::new(api, WatcherConfig::default());
        let context = Arc::new(ControllerContext {
            client: self.client.clone(),
            reconciler: Reconciler::new(store),
            backoff: ErrorBackoff::new(self.config.error_backoffs.clone())?,
            config: self.config,
            objects: controller.store(),
        });

        controller
            .run(reconcile, error_policy, context)
            .for_each(|result| async move {
                match result {
                    Ok((resource, action)) => {
                        info!("Reconciled {} - {:?}", resource.name, action);
                    }
                    Err(e) => {
                        error!("Reconciliation error: {:?}", e);
                    }
                }
            })
            .await;

        Ok(())
    }
}

struct ControllerContext {
    client: Client,
    reconciler: Reconciler,
    backoff: ErrorBackoff,
    config: OperatorConfig,
    /// Objects currently known to the watcher.
    objects: Store<MySQL>,
}

fn object_key(resource: &MySQL) -> String {
    format!(
        "{}/{}",
        resource.namespace().unwrap_or_default(),
        resource.name_any()
    )
}

// Objects deleted while still failing never reach a successful pass, so
// their attempt counts are dropped once the watcher no longer lists them.
fn forget_vanished(ctx: &ControllerContext) {
    if ctx.backoff.tracked() == 0 {
        return;
    }
    let live: HashSet<String> = ctx.objects.state().iter().map(|o| object_key(o)).collect();
    ctx.backoff.retain(|key| live.contains(key));
}

async fn reconcile(resource: Arc<MySQL>, ctx: Arc<ControllerContext>) -> Result<Action> {
    forget_vanished(&ctx);

    let parent = ParentDescriptor::from_resource(&resource)?;
    let finalizer = ctx.config.finalizer.as_str();
    let has_finalizer = resource.finalizers().iter().any(|f| f == finalizer);

    if resource.meta().deletion_timestamp.is_some() {
        if has_finalizer {
            info!(name = %parent.name, namespace = %parent.namespace, "Handling deletion");
            ctx.reconciler.on_delete(&parent).await?;
            remove_finalizer(&ctx.client, &resource, finalizer).await?;
        }
        ctx.backoff.reset(&object_key(&resource));
        return Ok(Action::await_change());
    }

    if !has_finalizer {
        add_finalizer(&ctx.client, &resource, finalizer).await?;
    }

    ctx.reconciler.on_create(&parent).await?;
    ctx.backoff.reset(&object_key(&resource));

    Ok(match ctx.config.requeue_after {
        Some(duration) => Action::requeue(duration),
        None => Action::await_change(),
    })
}

fn error_policy(resource: Arc<MySQL>, error: &Error, ctx: Arc<ControllerContext>) -> Action {
    let key = object_key(&resource);
    let delay = ctx.backoff.next_delay(&key);
    if error.is_validation() {
        warn!(object = %key, retry_in = ?delay, "Invalid MySQL spec: {}", error);
    } else {
        error!(object = %key, retry_in = ?delay, "Error reconciling: {:?}", error);
    }
    Action::requeue(delay)
}

async fn add_finalizer(client: &Client, resource: &MySQL, finalizer: &str) -> Result<()> {
    let mut finalizers = resource.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    patch_finalizers(client, resource, finalizers).await?;
    info!("Added finalizer {} to {}", finalizer, resource.name_any());
    Ok(())
}

async fn remove_finalizer(client: &Client, resource: &MySQL, finalizer: &str) -> Result<()> {
    let finalizers: Vec<String> = resource
        .finalizers()
        .iter()
        .filter(|f| *f != finalizer)
        .cloned()
        .collect();
    patch_finalizers(client, resource, finalizers).await?;
    info!("Removed finalizer {} from {}", finalizer, resource.name_any());
    Ok(())
}

async fn patch_finalizers(client: &Client, resource: &MySQL, finalizers: Vec<String>) -> Result<()> {
    let namespace = resource
        .namespace()
        .ok_or(Error::MissingField("metadata.namespace"))?;
    let api: Api<MySQL> = Api::namespaced(client.clone(), &namespace);

    let patch = serde_json::json!({
        "metadata": {
            "finalizers": finalizers
        }
    });

    api.patch(&resource.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .map_err(Error::Kube)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FINALIZER;
    use crate::crd::MySQLSpec;
    use crate::desired::ChildKind;
    use crate::store::{MemoryStore, Operation};
    use http::{Method, Request, Response};
    use kube::client::Body;
    use kube::runtime::reflector::{self, store::Writer};
    use kube::runtime::watcher;
    use serde_json::json;
    use std::time::Duration;
    use tower_test::mock::{self, Handle};

    const OTHER_FINALIZER: &str = "backup.acme.io/protect";

    type ApiServer = Handle<Request<Body>, Response<Body>>;

    struct Harness {
        ctx: Arc<ControllerContext>,
        store: Arc<MemoryStore>,
        objects: Writer<MySQL>,
    }

    impl Harness {
        fn new() -> (Self, ApiServer) {
            let (service, server) = mock::pair::<Request<Body>, Response<Body>>();
            let store = Arc::new(MemoryStore::new());
            let (objects, writer) = reflector::store();
            let ctx = Arc::new(ControllerContext {
                client: Client::new(service, "default"),
                reconciler: Reconciler::new(store.clone()),
                backoff: ErrorBackoff::default(),
                config: OperatorConfig::default(),
                objects,
            });
            let harness = Self {
                ctx,
                store,
                objects: writer,
            };
            (harness, server)
        }

        fn observe(&mut self, resource: &MySQL) {
            self.objects
                .apply_watcher_event(&watcher::Event::Apply(resource.clone()));
        }

        async fn create_children(&self, resource: &MySQL) {
            let parent = ParentDescriptor::from_resource(resource).unwrap();
            self.ctx.reconciler.on_create(&parent).await.unwrap();
        }

        async fn reconcile(&self, resource: &MySQL) -> Result<Action> {
            let pass = reconcile(Arc::new(resource.clone()), self.ctx.clone());
            tokio::time::timeout(Duration::from_secs(5), pass)
                .await
                .expect("reconcile waited on an unanswered API request")
        }
    }

    fn mysql(finalizers: &[&str], deleting: bool) -> MySQL {
        let mut resource = MySQL::new("db1", MySQLSpec::new("mysql:8", "app", "p@ss", "5Gi"));
        resource.metadata.namespace = Some("ns1".to_string());
        resource.metadata.uid = Some("uid-db1".to_string());
        if !finalizers.is_empty() {
            resource.metadata.finalizers =
                Some(finalizers.iter().map(|f| f.to_string()).collect());
        }
        if deleting {
            resource.metadata.deletion_timestamp =
                Some(serde_json::from_value(json!("2026-10-17T00:00:00Z")).unwrap());
        }
        resource
    }

    /// Answers a single finalizer merge patch on `ns1/db1` and hands back its body.
    async fn serve_finalizer_patch(mut server: ApiServer, resource: MySQL) -> serde_json::Value {
        let (request, send) = server.next_request().await.expect("no API request made");
        assert_eq!(request.method(), Method::PATCH);
        assert_eq!(
            request.uri().path(),
            "/apis/otus.homework/v1/namespaces/ns1/mysqls/db1"
        );
        assert_eq!(
            request.headers().get("content-type").unwrap(),
            "application/merge-patch+json"
        );
        let body = request.into_body().collect_bytes().await.unwrap();
        let patch: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let mut patched = resource;
        patched.metadata.finalizers =
            serde_json::from_value(patch["metadata"]["finalizers"].clone()).unwrap();
        let response = serde_json::to_vec(&patched).unwrap();
        send.send_response(Response::builder().body(Body::from(response)).unwrap());
        patch
    }

    async fn assert_no_request(server: &mut ApiServer) {
        let next = tokio::time::timeout(Duration::from_millis(50), server.next_request()).await;
        assert!(next.is_err(), "unexpected API request");
    }

    #[tokio::test]
    async fn first_sight_adds_finalizer_before_creating_children() {
        let (harness, server) = Harness::new();
        let resource = mysql(&[], false);
        let api = tokio::spawn(serve_finalizer_patch(server, resource.clone()));

        let action = harness.reconcile(&resource).await.unwrap();

        let patch = api.await.unwrap();
        assert_eq!(patch["metadata"]["finalizers"], json!([DEFAULT_FINALIZER]));
        assert_eq!(harness.store.len(), 7);
        assert_eq!(action, Action::await_change());
    }

    #[tokio::test]
    async fn finalized_object_reconciles_without_patching() {
        let (harness, mut server) = Harness::new();

        harness
            .reconcile(&mysql(&[DEFAULT_FINALIZER], false))
            .await
            .unwrap();

        assert_eq!(harness.store.len(), 7);
        assert_no_request(&mut server).await;
    }

    #[tokio::test]
    async fn success_resets_backoff() {
        let (mut harness, _server) = Harness::new();
        let resource = mysql(&[DEFAULT_FINALIZER], false);
        harness.observe(&resource);
        harness.ctx.backoff.next_delay("ns1/db1");
        harness.ctx.backoff.next_delay("ns1/db1");

        harness.reconcile(&resource).await.unwrap();

        assert_eq!(harness.ctx.backoff.attempts("ns1/db1"), 0);
        let err = Error::Other("quota exceeded".to_string());
        let action = error_policy(Arc::new(resource), &err, harness.ctx.clone());
        assert_eq!(action, Action::requeue(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn deletion_runs_delete_path_then_releases_finalizer() {
        let (harness, server) = Harness::new();
        let resource = mysql(&[OTHER_FINALIZER, DEFAULT_FINALIZER], true);
        harness.create_children(&resource).await;
        let api = tokio::spawn(serve_finalizer_patch(server, resource.clone()));

        let action = harness.reconcile(&resource).await.unwrap();

        let patch = api.await.unwrap();
        assert_eq!(patch["metadata"]["finalizers"], json!([OTHER_FINALIZER]));
        assert_eq!(harness.store.calls(Operation::Delete), 6);
        assert_eq!(harness.store.len(), 1);
        assert_eq!(action, Action::await_change());
    }

    #[tokio::test]
    async fn failed_delete_keeps_finalizer() {
        let (harness, mut server) = Harness::new();
        let resource = mysql(&[DEFAULT_FINALIZER], true);
        harness.create_children(&resource).await;
        harness
            .store
            .fail(Operation::Delete, ChildKind::VolumeClaim, "connection reset");

        let err = harness.reconcile(&resource).await.unwrap_err();

        assert!(matches!(&err, Error::Other(msg) if msg == "connection reset"), "{err:?}");
        assert_no_request(&mut server).await;
        let action = error_policy(Arc::new(resource), &err, harness.ctx.clone());
        assert_eq!(action, Action::requeue(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn deletion_without_our_finalizer_is_left_alone() {
        let (harness, mut server) = Harness::new();
        let resource = mysql(&[OTHER_FINALIZER], true);
        harness.create_children(&resource).await;

        let action = harness.reconcile(&resource).await.unwrap();

        assert_eq!(action, Action::await_change());
        assert_eq!(harness.store.calls(Operation::Delete), 0);
        assert_eq!(harness.store.len(), 7);
        assert_no_request(&mut server).await;
    }

    #[tokio::test]
    async fn error_policy_walks_backoff_schedule() {
        let (harness, _server) = Harness::new();
        let resource = Arc::new(mysql(&[DEFAULT_FINALIZER], false));
        let invalid = Error::validation("password", "is required");
        let failed = Error::Other("etcd unavailable".to_string());

        let delays: Vec<Action> = [&invalid, &failed, &failed, &invalid]
            .into_iter()
            .map(|err| error_policy(resource.clone(), err, harness.ctx.clone()))
            .collect();

        let expected: Vec<Action> = [10, 20, 30, 30]
            .into_iter()
            .map(|s| Action::requeue(Duration::from_secs(s)))
            .collect();
        assert_eq!(delays, expected);
        assert_eq!(harness.ctx.backoff.attempts("ns1/db1"), 4);
    }

    #[tokio::test]
    async fn vanished_objects_are_dropped_from_backoff() {
        let (mut harness, _server) = Harness::new();
        let resource = mysql(&[DEFAULT_FINALIZER], false);
        harness.observe(&resource);
        harness.ctx.backoff.next_delay("ns1/db1");
        harness.ctx.backoff.next_delay("ns1/gone");
        harness
            .store
            .fail(Operation::Create, ChildKind::Secret, "etcd unavailable");

        assert!(harness.reconcile(&resource).await.is_err());

        assert_eq!(harness.ctx.backoff.attempts("ns1/gone"), 0);
        assert_eq!(harness.ctx.backoff.attempts("ns1/db1"), 1);
    }
}
