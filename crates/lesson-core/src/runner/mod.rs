//! Runner de lecciones: FSM de navegación sobre los módulos del manifest.

mod builder;
mod config;
mod core;
mod outcome;
mod phase;
mod restore;

pub use builder::RunnerBuilder;
pub use config::RunnerConfig;
pub use self::core::LessonRunner;
pub use outcome::{DropReason, NavOutcome};
pub use phase::RunnerPhase;
pub use restore::{RestorePlan, RestoreToken};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::errors::{CoreEngineError, MethodError};
    use crate::manifest::{ArtifactSpec, Manifest, ModuleSpec, OnEnterAction, Trigger};
    use crate::method::{create_method, MethodBehavior, MethodCore, Passive};
    use crate::registry::MethodRegistry;
    use serde_json::{json, Value};

    // Un paso por input; completa en el último.
    #[derive(Debug, Default)]
    struct Steps;

    impl MethodBehavior for Steps {
        fn on_init(&mut self, core: &mut MethodCore, options: &Value) -> Result<(), MethodError> {
            core.set_total_steps(options.get("steps").and_then(Value::as_u64).unwrap_or(1) as u32);
            Ok(())
        }

        fn on_input(&mut self, core: &mut MethodCore, _input: &Value) -> Result<(), MethodError> {
            core.advance_step();
            if core.current_step() >= core.total_steps() {
                core.mark_complete();
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Broken;

    impl MethodBehavior for Broken {
        fn on_init(&mut self, _core: &mut MethodCore, _options: &Value) -> Result<(), MethodError> {
            Err(MethodError::InvalidConfig("always".into()))
        }
    }

    fn registry() -> MethodRegistry {
        let mut r = MethodRegistry::new();
        r.register("steps", || create_method("steps", Steps));
        r.register("passive", || create_method("passive", Passive));
        r.register("broken", || create_method("broken", Broken));
        r
    }

    fn lesson(types: &[&str]) -> Manifest {
        let modules = types.iter()
                           .enumerate()
                           .map(|(i, t)| ModuleSpec::new(format!("m{i}"), *t).with_config(json!({ "steps": 1 })))
                           .collect();
        Manifest::new("test", modules).with_id("lesson-1")
    }

    fn runner(clock: &ManualClock, manifest: Manifest) -> LessonRunner<crate::event::InMemoryEventStore> {
        let mut r = LessonRunner::builder().registry(registry())
                                           .clock(clock.clone())
                                           .config(RunnerConfig::from_millis(100, 200))
                                           .build();
        r.load_lesson(manifest).expect("load");
        r
    }

    #[test]
    fn navigation_waits_for_opening_gesture() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps"]));
        assert_eq!(r.phase(), RunnerPhase::AwaitingStart);
        assert_eq!(r.next_module(), NavOutcome::Dropped(DropReason::AwaitingStart));
        assert_eq!(r.index(), -1);
        assert_eq!(r.begin(), NavOutcome::Entered { from: -1, to: 0 });
        assert_eq!(r.begin(), NavOutcome::Dropped(DropReason::AlreadyStarted));
        assert_eq!(r.event_variants(), vec!["L", "T", "W", "D", "R", "E", "D"]);
    }

    #[test]
    fn requests_inside_cooldown_are_dropped() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps", "steps"]));
        r.begin();
        assert_eq!(r.next_module(), NavOutcome::Dropped(DropReason::InFlight));
        clock.advance_ms(100);
        assert_eq!(r.next_module(), NavOutcome::Entered { from: 0, to: 1 });
        assert_eq!(r.next_module(), NavOutcome::Dropped(DropReason::InFlight));
        assert_eq!(r.index(), 1);
        assert_eq!(r.instance_names(), vec!["steps".to_string()]);
    }

    #[test]
    fn completion_schedules_a_single_auto_advance() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps"]));
        r.begin();
        r.dispatch_input(&json!({})).expect("input");
        assert!(r.pending_advance().is_some());
        assert_eq!(r.tick(), None);
        clock.advance_ms(200);
        assert_eq!(r.tick(), Some(NavOutcome::Entered { from: 0, to: 1 }));
        assert_eq!(r.tick(), None);

        clock.advance_ms(100);
        r.dispatch_input(&json!({})).expect("input");
        clock.advance_ms(200);
        assert_eq!(r.tick(), Some(NavOutcome::Finished));
        assert!(r.is_finished());
        assert_eq!(r.index(), 2);
        assert!(r.active().is_none());
        let finished = r.event_variants().iter().filter(|c| **c == "F").count();
        assert_eq!(finished, 1);
        assert_eq!(r.next_module(), NavOutcome::Dropped(DropReason::Finished));
    }

    #[test]
    fn deadlines_saturate_at_the_end_of_time() {
        let clock = ManualClock::new(chrono::DateTime::<chrono::Utc>::MAX_UTC);
        let mut r = LessonRunner::builder().registry(registry())
                                           .clock(clock.clone())
                                           .config(RunnerConfig::from_millis(i64::MAX, i64::MAX))
                                           .build();
        r.load_lesson(lesson(&["steps", "steps"])).expect("load");
        assert_eq!(r.begin(), NavOutcome::Entered { from: -1, to: 0 });
        r.dispatch_input(&json!({})).expect("input");
        assert!(r.pending_advance().is_some());
        assert_eq!(r.tick(), Some(NavOutcome::Entered { from: 0, to: 1 }));
    }

    #[test]
    fn manual_navigation_cancels_pending_advance() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps", "steps"]));
        r.begin();
        clock.advance_ms(100);
        r.dispatch_input(&json!({})).expect("input");
        r.next_module();
        clock.advance_ms(500);
        assert_eq!(r.tick(), None);
        assert_eq!(r.index(), 1);
    }

    #[test]
    fn unresolved_type_aborts_without_moving() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "ghost"]));
        r.begin();
        clock.advance_ms(100);
        let out = r.next_module();
        assert_eq!(out, NavOutcome::Aborted(CoreEngineError::UnresolvedMethodType("ghost".into())));
        assert_eq!(r.index(), 0);
        assert_eq!(r.active().map(|a| a.name()), Some("steps"));
    }

    #[test]
    fn missing_container_aborts_before_teardown() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps"]));
        r.begin();
        clock.advance_ms(100);
        r.detach_container();
        assert_eq!(r.next_module(), NavOutcome::Aborted(CoreEngineError::MissingRenderTarget));
        assert_eq!(r.index(), 0);
        assert!(r.active().is_some());
    }

    #[test]
    fn init_failure_keeps_index_and_clears_active() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "broken"]));
        r.begin();
        clock.advance_ms(100);
        assert!(matches!(r.next_module(), NavOutcome::Aborted(CoreEngineError::MethodInitFailed(_))));
        assert_eq!(r.index(), 0);
        assert!(r.active().is_none());
        assert_eq!(r.dispatch_input(&json!({})), Err(MethodError::NoActiveMethod));
    }

    #[test]
    fn out_of_range_requests_are_dropped() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps"]));
        r.begin();
        clock.advance_ms(100);
        assert_eq!(r.prev_module(), NavOutcome::Dropped(DropReason::OutOfRange(-1)));
        assert_eq!(r.jump_to(5), NavOutcome::Dropped(DropReason::OutOfRange(5)));
        assert_eq!(r.jump_to(2), NavOutcome::Finished);
    }

    #[test]
    fn empty_lesson_finishes_on_begin() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, Manifest::new("empty", Vec::new()));
        assert_eq!(r.begin(), NavOutcome::Finished);
        assert_eq!(r.index(), 0);
        assert!(r.is_finished());
    }

    #[test]
    fn on_enter_and_triggers_queue_collections() {
        let clock = ManualClock::default();
        let m0 = ModuleSpec::new("intro", "steps").with_config(json!({ "steps": 1 }))
                                                  .with_on_enter(OnEnterAction::CollectArtifact { id: "map".into() })
                                                  .with_artifact(ArtifactSpec::new("badge").with_trigger(Trigger::OnStepComplete))
                                                  .with_artifact(ArtifactSpec::new("key").with_trigger(Trigger::OnModuleEnter));
        let mut r = runner(&clock, Manifest::new("t", vec![m0]).with_artifact(ArtifactSpec::new("map")));
        r.begin();
        assert_eq!(r.take_collection_requests(), vec!["map".to_string(), "key".to_string()]);
        r.dispatch_input(&json!({})).expect("input");
        assert_eq!(r.take_collection_requests(), vec!["badge".to_string()]);
        assert!(r.take_collection_requests().is_empty());
    }

    #[test]
    fn restore_bypasses_gate_and_hands_over_tokens() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps", "steps"]));
        let plan = RestorePlan { index: 1,
                                 tokens: vec![RestoreToken { module_id: "m1".into(),
                                                             state: json!({ "currentStep": 1, "totalSteps": 1, "isComplete": true }) },
                                              RestoreToken { module_id: "m0".into(),
                                                             state: json!({ "currentStep": 1 }) }] };
        assert_eq!(r.apply_restore(plan), NavOutcome::Entered { from: -1, to: 1 });
        let active = r.active().expect("active");
        assert!(active.is_complete());
        assert_eq!(active.current_step(), 1);
        assert_eq!(r.begin(), NavOutcome::Dropped(DropReason::AlreadyStarted));

        // el token de m0 sigue pendiente hasta su primera entrada
        clock.advance_ms(100);
        r.prev_module();
        assert_eq!(r.active().map(|a| a.current_step()), Some(1));
        clock.advance_ms(100);
        r.next_module();
        clock.advance_ms(100);
        r.prev_module();
        assert_eq!(r.active().map(|a| a.current_step()), Some(0));
    }

    #[test]
    fn reload_destroys_active_and_rearms_gate() {
        let clock = ManualClock::default();
        let mut r = runner(&clock, lesson(&["steps"]));
        r.begin();
        r.load_lesson(lesson(&["passive"])).expect("reload");
        assert!(r.active().is_none());
        assert_eq!(r.index(), -1);
        assert_eq!(r.phase(), RunnerPhase::AwaitingStart);
        assert!(r.event_variants().contains(&"X"));
    }
}
