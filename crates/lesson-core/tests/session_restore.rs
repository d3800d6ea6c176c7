//! Snapshot, persistencia y precedencia de arranque.

use std::rc::Rc;

use lesson_adapters::{register_builtin, PROGRESSIVE_DISCLOSURE, SCENARIO};
use lesson_core::session::RecordingHostChannel;
use lesson_core::{ArtifactRegistry, ArtifactSpec, HostMessage, InMemorySnapshotStore, LessonRunner, LessonSession,
                  ManualClock, Manifest, MethodRegistry, ModuleSpec, NavOutcome, RecoverySource, RunnerPhase,
                  SessionSnapshot, SessionStateManager, SnapshotError, SnapshotStore};
use serde_json::json;

const KEY: &str = "test:snapshot";

fn manifest() -> Manifest {
    let scenario = json!({
        "start": "q",
        "nodes": { "q": { "choices": [ { "goto": "end" } ] }, "end": { "artifact": "key" } }
    });
    Manifest::new("Restore",
                  vec![ModuleSpec::new("intro", PROGRESSIVE_DISCLOSURE).with_config(json!({ "panels": ["a", "b"] })),
                       ModuleSpec::new("quest", SCENARIO).with_config(scenario),
                       ModuleSpec::new("outro", PROGRESSIVE_DISCLOSURE).with_config(json!({ "panels": ["z"] }))])
        .with_id("restore-lesson")
        .with_artifact(ArtifactSpec::new("key"))
        .with_artifact(ArtifactSpec::new("map"))
}

struct Fixture {
    clock: ManualClock,
    store: InMemorySnapshotStore,
    host: RecordingHostChannel,
}

impl Fixture {
    fn new() -> Self {
        Self { clock: ManualClock::default(),
               store: InMemorySnapshotStore::new(),
               host: RecordingHostChannel::default() }
    }

    fn session(&self) -> LessonSession {
        let mut registry = MethodRegistry::new();
        register_builtin(&mut registry);
        let runner = LessonRunner::builder().registry(registry).clock(self.clock.clone()).build();
        let state = SessionStateManager::new(Box::new(self.store.clone()), Rc::new(self.clock.clone()))
            .with_host(Box::new(self.host.clone()))
            .with_key(KEY);
        let mut s = LessonSession::new(runner, ArtifactRegistry::default(), state);
        s.load_lesson(manifest()).expect("load");
        s
    }

    /// Sesión que llegó a `quest` con `map` colectado; autosave deja el snapshot en el store.
    fn played(&self) -> SessionSnapshot {
        let mut s = self.session();
        s.begin();
        s.collect("map");
        self.clock.advance_ms(1000);
        s.next_module();
        s.snapshot().expect("snapshot")
    }
}

#[test]
fn save_persists_and_notifies_host() {
    let fx = Fixture::new();
    let snap = fx.played();
    let raw = fx.store.get(KEY).expect("get").expect("persisted");
    let stored = SessionSnapshot::from_slice(&raw).expect("decode");
    assert_eq!(stored.navigation.active_module_id.as_deref(), Some("quest"));
    assert_eq!(stored.inventory.collected_ids, snap.inventory.collected_ids);
    let saved = fx.host.messages().iter().filter(|m| matches!(m, HostMessage::SnapshotSaved { .. })).count();
    assert_eq!(saved, 2);
}

#[test]
fn boot_prefers_persisted_over_cold() {
    let fx = Fixture::new();
    fx.played();
    let mut s = fx.session();
    assert_eq!(s.boot(), RecoverySource::Persisted);
    assert_eq!(s.runner().index(), 1);
    assert!(s.artifacts().has("map"));
    assert!(matches!(s.runner().phase(), RunnerPhase::Transitioning { index: 1, .. }));
    assert!(matches!(fx.host.messages().last(),
                     Some(HostMessage::SessionRestored { source: RecoverySource::Persisted, active_module_index: 1 })));
}

#[test]
fn injected_snapshot_outranks_persisted_and_is_consumed() {
    let fx = Fixture::new();
    fx.played();

    let mut injected = fx.played();
    injected.navigation = lesson_core::session::NavigationState { active_module_index: 2,
                                                                  active_module_id: Some("outro".into()) };
    injected.modules.clear();
    let mut s = fx.session();
    s.inject_snapshot(injected.to_bytes().expect("bytes"));
    assert_eq!(s.boot(), RecoverySource::Injected);
    assert_eq!(s.runner().index(), 2);
    assert!(!s.state().has_injected());
}

#[test]
fn malformed_injected_falls_through_to_persisted() {
    let fx = Fixture::new();
    fx.played();
    let mut s = fx.session();
    s.inject_snapshot(b"{ definitely not a snapshot".to_vec());
    assert_eq!(s.boot(), RecoverySource::Persisted);
    assert_eq!(s.runner().index(), 1);
}

#[test]
fn cold_start_when_nothing_usable() {
    let fx = Fixture::new();
    let mut s = fx.session();
    assert_eq!(s.boot(), RecoverySource::Cold);
    assert_eq!(s.runner().index(), -1);
    assert_eq!(s.runner().phase(), RunnerPhase::AwaitingStart);
    assert_eq!(s.begin(), NavOutcome::Entered { from: -1, to: 0 });
}

#[test]
fn foreign_lesson_is_rejected_before_mutation() {
    let fx = Fixture::new();
    let mut snap = fx.played();
    snap.course.lesson_id = "another-lesson".into();
    let mut s = fx.session();
    let err = s.restore(&snap).unwrap_err();
    assert!(matches!(err, SnapshotError::LessonMismatch { .. }));
    assert_eq!(s.artifacts().count(), 0);
    assert_eq!(s.runner().index(), -1);
}

#[test]
fn vanished_module_keeps_inventory_but_not_navigation() {
    let fx = Fixture::new();
    let mut snap = fx.played();
    snap.navigation.active_module_id = Some("deleted".into());
    let mut s = fx.session();
    assert_eq!(s.restore(&snap), Ok(NavOutcome::Unchanged));
    assert!(s.artifacts().has("map"));
    assert_eq!(s.runner().index(), -1);
    assert_eq!(s.runner().phase(), RunnerPhase::AwaitingStart);
}

#[test]
fn module_state_is_restored_through_token() {
    let fx = Fixture::new();
    let mut s = fx.session();
    s.begin();
    s.dispatch_input(&json!({ "action": "next" })).expect("input");
    let snap = s.snapshot().expect("snapshot");
    assert_eq!(snap.modules["intro"]["currentStep"], json!(1));

    let mut again = fx.session();
    again.restore(&snap).expect("restore");
    let active = again.runner().active().expect("active");
    assert_eq!(active.current_step(), 1);
    assert!(!active.is_complete());
}

#[test]
fn finished_snapshot_restores_to_finished() {
    let fx = Fixture::new();
    let mut s = fx.session();
    s.begin();
    fx.clock.advance_ms(1000);
    s.jump_to(3);
    let snap = s.snapshot().expect("snapshot");
    assert!(snap.course.is_complete);
    assert_eq!(snap.course.progress, 1.0);
    assert_eq!(snap.navigation.active_module_id, None);

    let mut again = fx.session();
    assert_eq!(again.restore(&snap), Ok(NavOutcome::Finished));
    assert!(again.runner().is_finished());
}
