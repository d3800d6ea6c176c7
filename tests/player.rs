//! Reproductor headless de extremo a extremo con los métodos de referencia.

use std::path::Path;
use std::rc::Rc;

use lesson_adapters::register_builtin;
use lesson_core::session::RecordingHostChannel;
use lesson_core::{ArtifactRegistry, Clock, HostMessage, InMemorySnapshotStore, LessonRunner, LessonSession, ManualClock,
                  Manifest, MethodRegistry, RecoverySource, SessionStateManager};
use lesson_persistence::{FileEventStore, FileSnapshotStore};
use lessonflow::{play, Script, ScriptStep};
use serde_json::json;

const MANIFEST: &str = r##"{
  "id": "demo",
  "title": "Demo",
  "theme": { "primaryColor": "#224466" },
  "modules": [
    { "id": "intro", "title": "Intro", "type": "ProgressiveDisclosureMethod",
      "content": { "panels": ["hola", { "title": "mapa", "artifact": "map" }] } },
    { "id": "quest", "title": "Quest", "type": "scenario",
      "config": { "start": "gate",
                  "nodes": { "gate": { "choices": [ { "label": "entrar", "goto": "vault" } ] },
                             "vault": { "artifact": "key" } } },
      "artifacts": [ { "id": "key", "label": "Llave" } ] },
    { "id": "wrap", "title": "Cierre", "type": "bundle",
      "config": { "parts": [ { "name": "a", "panels": ["x"] }, { "name": "b", "panels": ["y"] } ] },
      "onEnter": { "action": "signal", "name": "confetti", "payload": { "level": 2 } } }
  ],
  "artifacts": [ { "id": "map", "label": "Mapa" } ]
}"##;

fn session(clock: &ManualClock, host: RecordingHostChannel) -> LessonSession {
    let mut registry = MethodRegistry::new();
    register_builtin(&mut registry);
    let runner = LessonRunner::builder().registry(registry).clock(clock.clone()).build();
    let state = SessionStateManager::new(Box::new(InMemorySnapshotStore::new()), Rc::new(clock.clone()))
        .with_host(Box::new(host));
    let mut s = LessonSession::new(runner, ArtifactRegistry::default(), state);
    s.load_lesson(Manifest::from_json(MANIFEST).expect("manifest")).expect("load");
    s
}

fn file_session(clock: &ManualClock, dir: &Path) -> LessonSession<FileEventStore> {
    let mut registry = MethodRegistry::new();
    register_builtin(&mut registry);
    let journal = FileEventStore::new(dir.join("journal")).expect("journal");
    let runner = LessonRunner::builder_with_store(journal).registry(registry).clock(clock.clone()).build();
    let store = FileSnapshotStore::new(dir).expect("store");
    let state = SessionStateManager::new(Box::new(store), Rc::new(clock.clone()));
    let mut s = LessonSession::new(runner, ArtifactRegistry::default(), state);
    s.load_lesson(Manifest::from_json(MANIFEST).expect("manifest")).expect("load");
    s
}

#[test]
fn script_accepts_array_and_json_lines() {
    let array = Script::parse(r#"[ { "op": "next" }, { "op": "wait", "ms": 10 } ]"#).expect("array");
    let lines = Script::parse("# comentario\n{ \"op\": \"next\" }\n\n{ \"op\": \"wait\", \"ms\": 10 }\n").expect("lines");
    assert_eq!(array, lines);
    assert_eq!(array.steps[1], ScriptStep::Wait { ms: 10 });
    assert!(Script::parse("{ \"op\": \"fly\" }").is_err());
}

#[test]
fn full_playthrough_collects_everything_and_finishes() {
    let clock = ManualClock::default();
    let host = RecordingHostChannel::default();
    let mut s = session(&clock, host.clone());
    let script = Script { steps: vec![ScriptStep::Input { value: json!({ "action": "next" }) },
                                      ScriptStep::Input { value: json!({ "action": "next" }) },
                                      ScriptStep::Wait { ms: 1200 },
                                      ScriptStep::Input { value: json!({ "choice": 0 }) },
                                      ScriptStep::Wait { ms: 1200 },
                                      ScriptStep::Input { value: json!({ "part": "a", "action": "next" }) },
                                      ScriptStep::Input { value: json!({ "part": "b", "action": "next" }) },
                                      ScriptStep::Wait { ms: 1200 }] };
    let report = play(&mut s, &clock, &script);
    assert!(report.finished);
    assert_eq!(report.final_index, 3);
    assert_eq!(report.collected, vec!["map".to_string(), "key".to_string()]);
    assert_eq!(report.rejected, 0);
    assert!(report.events.contains(&"G"));
    let saves = host.messages().iter().filter(|m| matches!(m, HostMessage::SnapshotSaved { .. })).count();
    assert_eq!(saves, 4);
}

#[test]
fn early_navigation_is_counted_as_rejected() {
    let clock = ManualClock::default();
    let mut s = session(&clock, RecordingHostChannel::default());
    let script = Script { steps: vec![ScriptStep::Next, ScriptStep::Prev, ScriptStep::Input { value: json!({}) }] };
    let report = play(&mut s, &clock, &script);
    assert_eq!(report.final_index, 0);
    assert_eq!(report.rejected, 3);
}

#[test]
fn negative_wait_is_rejected() {
    let err = Script::parse(r#"[ { "op": "wait", "ms": -100000 }, { "op": "next" } ]"#).unwrap_err();
    assert!(err.to_string().contains("step 1"));
    assert!(Script::parse("{ \"op\": \"wait\", \"ms\": -1 }\n").is_err());

    // un guion construido a mano tampoco mueve el reloj hacia atrás
    let clock = ManualClock::default();
    let mut s = session(&clock, RecordingHostChannel::default());
    let before = clock.now();
    let report = play(&mut s, &clock, &Script { steps: vec![ScriptStep::Wait { ms: -100_000 }] });
    assert_eq!(clock.now(), before);
    assert_eq!(report.rejected, 1);
}

#[test]
fn huge_wait_does_not_overflow_the_clock() {
    let clock = ManualClock::default();
    let mut s = session(&clock, RecordingHostChannel::default());
    let script = Script::parse(r#"[ { "op": "wait", "ms": 9223372036854775807 }, { "op": "next" } ]"#).expect("script");
    let report = play(&mut s, &clock, &script);
    assert_eq!(report.final_index, 1);
    assert_eq!(report.rejected, 0);
}

#[test]
fn progress_survives_a_restart_through_the_state_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let clock = ManualClock::default();

    let mut first = file_session(&clock, dir.path());
    let opening = Script { steps: vec![ScriptStep::Input { value: json!({ "action": "revealAll" }) },
                                       ScriptStep::Wait { ms: 1200 }] };
    let report = play(&mut first, &clock, &opening);
    assert_eq!(report.final_index, 1);
    assert_eq!(report.collected, vec!["map".to_string()]);
    drop(first);

    let mut second = file_session(&clock, dir.path());
    assert_eq!(second.boot(), RecoverySource::Persisted);
    assert_eq!(second.runner().index(), 1);
    assert!(second.artifacts().has("map"));
    let rest = Script { steps: vec![ScriptStep::Input { value: json!({ "choice": 0 }) },
                                    ScriptStep::Wait { ms: 1200 },
                                    ScriptStep::Input { value: json!({ "part": "a", "action": "next" }) },
                                    ScriptStep::Input { value: json!({ "part": "b", "action": "next" }) },
                                    ScriptStep::Wait { ms: 1200 }] };
    let report = play(&mut second, &clock, &rest);
    assert!(report.finished);
    assert_eq!(report.collected, vec!["map".to_string(), "key".to_string()]);
    assert!(dir.path().join("journal").is_dir());
}
