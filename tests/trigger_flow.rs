// ABOUTME: End-to-end tests from an accepted trigger to a finished swap.
// ABOUTME: Uses the spawning scheduler with the fake runtime and paused time.

mod support;

use std::sync::Arc;
use std::time::Duration;
use support::fake_runtime::{FakeRuntime, Op};
use support::recording::RecordingNotifier;
use swapd::store::{DeploymentSettings, MemorySettingsStore};
use swapd::swap::{ContainerTemplate, InFlight, Orchestrator, SpawnScheduler};
use swapd::trigger::{SharedSecret, Trigger, TriggerError, TriggerRequest};
use swapd::types::InstanceName;

struct Flow {
    runtime: Arc<FakeRuntime>,
    notifier: Arc<RecordingNotifier>,
    inflight: InFlight,
    trigger: Trigger,
}

fn flow() -> Flow {
    flow_with(InFlight::new())
}

fn flow_with(inflight: InFlight) -> Flow {
    support::init_tracing();
    let runtime = Arc::new(FakeRuntime::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemorySettingsStore::with(DeploymentSettings::new(2).unwrap()));
    let orchestrator = Orchestrator::new(
        runtime.clone(),
        store,
        notifier.clone(),
        ContainerTemplate::default(),
    );
    let trigger = Trigger::new(
        SharedSecret::new("abc"),
        vec!["registry.example.com/team/".to_string()],
        inflight.clone(),
        Arc::new(SpawnScheduler::new(Arc::new(orchestrator))),
    );
    Flow {
        runtime,
        notifier,
        inflight,
        trigger,
    }
}

fn request(image: &str) -> TriggerRequest {
    TriggerRequest {
        secret: "abc".to_string(),
        image_reference: image.to_string(),
    }
}

fn app() -> InstanceName {
    InstanceName::new("app").unwrap()
}

#[tokio::test(start_paused = true)]
async fn accepted_trigger_swaps_in_background() {
    let f = flow();
    f.runtime.seed("app", "registry.example.com/team/app:v1", true);

    let ack = f
        .trigger
        .accept(request("registry.example.com/team/app:v2"))
        .unwrap();
    assert_eq!(ack.base_name, "app");
    assert!(f.inflight.is_active(&app()));

    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!f.inflight.is_active(&app()));
    let named = f.runtime.named("app");
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].image, "registry.example.com/team/app:v2");
    assert!(f.notifier.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn overlapping_trigger_for_same_base_name_is_rejected() {
    let f = flow();

    f.trigger
        .accept(request("registry.example.com/team/app:v2"))
        .unwrap();
    let err = f
        .trigger
        .accept(request("registry.example.com/team/app:v3"))
        .unwrap_err();
    assert!(matches!(err, TriggerError::InProgress(_)));

    tokio::time::sleep(Duration::from_secs(10)).await;

    f.trigger
        .accept(request("registry.example.com/team/app:v3"))
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_background_swap_notifies_and_releases_claim() {
    let f = flow();
    f.runtime.fail_next(Op::Pull, "manifest unknown");

    f.trigger
        .accept(request("registry.example.com/team/app:v2"))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!f.inflight.is_active(&app()));
    let messages = f.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("registry.example.com/team/app:v2"));
    assert!(messages[0].contains("pulling"));
    assert!(f.runtime.containers().is_empty());
}

#[tokio::test(start_paused = true)]
async fn base_name_locked_by_another_process_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let f = flow_with(InFlight::new().with_lock_dir(dir.path()));
    let other_process = InFlight::new().with_lock_dir(dir.path());

    let held = other_process.claim(&app()).unwrap();
    let err = f
        .trigger
        .accept(request("registry.example.com/team/app:v2"))
        .unwrap_err();
    assert!(matches!(err, TriggerError::InProgress(_)));
    assert!(f.runtime.calls().is_empty());

    drop(held);
    f.trigger
        .accept(request("registry.example.com/team/app:v2"))
        .unwrap();
    assert!(dir.path().join("app.lock").exists());

    tokio::time::sleep(Duration::from_secs(10)).await;

    // Lock file goes away with the finished swap.
    assert!(!dir.path().join("app.lock").exists());
    assert_eq!(f.runtime.named("app").len(), 1);
}
