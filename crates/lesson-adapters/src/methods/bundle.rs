//! BundleMethod (compuesto)
//!
//! - Config: `{ "parts": [ { "name": "intro", "panels": [...] }, ... ] }`;
//!   cada parte es un `RevealMethod` hijo.
//! - Input: `{ "part": "intro", "action": "next" }` se reenvía al hijo sin el
//!   campo `part`.
//! - Un paso por parte completada; el bundle se completa cuando lo están
//!   todas. Los `Complete` de los hijos suben como eventos burbujeados y no
//!   cuentan como finalización del bundle.

use std::collections::{BTreeMap, BTreeSet};

use lesson_core::{create_method, MethodBehavior, MethodCore, MethodError};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{parse_config, parse_input, RevealMethod};

#[derive(Debug, Deserialize)]
struct PartConfig {
    name: String,
    #[serde(flatten)]
    options: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct BundleConfig {
    #[serde(default)]
    parts: Vec<PartConfig>,
}

#[derive(Debug, Deserialize)]
struct PartInput {
    part: String,
}

#[derive(Debug, Default)]
pub struct BundleMethod {
    done: BTreeSet<String>,
    parts_state: BTreeMap<String, Value>,
    /// Estado recibido antes de que existieran los hijos.
    pending: BTreeMap<String, Value>,
}

impl MethodBehavior for BundleMethod {
    fn on_init(&mut self, core: &mut MethodCore, options: &Value) -> Result<(), MethodError> {
        let config: BundleConfig = parse_config(options)?;
        if config.parts.is_empty() {
            return Err(MethodError::InvalidConfig("bundle needs at least one part".into()));
        }
        let mut names = BTreeSet::new();
        for part in &config.parts {
            if !names.insert(part.name.clone()) {
                return Err(MethodError::InvalidConfig(format!("duplicate part '{}'", part.name)));
            }
        }
        let container = core.container()
                            .cloned()
                            .ok_or_else(|| MethodError::NotInitialized(core.name().to_string()))?;

        for part in config.parts {
            let mut child = create_method(part.name.clone(), RevealMethod::default());
            child.init(container.clone(), &Value::Object(part.options))?;
            child.take_outbox();
            if let Some(saved) = self.pending.remove(&part.name) {
                child.set_state(&saved);
            }
            if child.is_complete() {
                self.done.insert(part.name.clone());
            }
            self.parts_state.insert(part.name.clone(), child.get_state());
            core.add_child(child);
        }
        core.set_total_steps(names.len() as u32);
        debug!("bundle:init name={} parts={}", core.name(), names.len());
        Ok(())
    }

    fn on_input(&mut self, core: &mut MethodCore, input: &Value) -> Result<(), MethodError> {
        let PartInput { part } = parse_input(input)?;
        let mut forward = input.clone();
        if let Some(obj) = forward.as_object_mut() {
            obj.remove("part");
        }
        let (complete, state) = core.with_child(&part, |child| -> Result<(bool, Value), MethodError> {
                                        child.handle_input(&forward)?;
                                        Ok((child.is_complete(), child.get_state()))
                                    })??;
        self.parts_state.insert(part.clone(), state);
        if complete && self.done.insert(part) {
            core.advance_step();
            if core.current_step() == core.total_steps() {
                core.mark_complete();
            }
        }
        Ok(())
    }

    fn on_reset(&mut self, core: &mut MethodCore) {
        self.done.clear();
        let names: Vec<String> = core.children().iter().map(|c| c.name().to_string()).collect();
        for name in names {
            if let Ok(state) = core.with_child(&name, |child| {
                                   child.reset();
                                   child.get_state()
                               })
            {
                self.parts_state.insert(name, state);
            }
        }
    }

    fn state(&self) -> Map<String, Value> {
        let mut m = Map::new();
        let parts: Map<String, Value> = self.parts_state.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        m.insert("parts".into(), Value::Object(parts));
        m
    }

    fn apply_state(&mut self, core: &mut MethodCore, saved: &Map<String, Value>) {
        let Some(parts) = saved.get("parts").and_then(Value::as_object) else {
            return;
        };
        for (name, state) in parts {
            if core.child(name).is_none() {
                self.pending.insert(name.clone(), state.clone());
                continue;
            }
            if let Ok((complete, fresh)) = core.with_child(name, |child| {
                                                 child.set_state(state);
                                                 (child.is_complete(), child.get_state())
                                             })
            {
                if complete {
                    self.done.insert(name.clone());
                }
                self.parts_state.insert(name.clone(), fresh);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::{ContainerHandle, MethodEventKind, MethodInstance};
    use serde_json::json;

    fn bundle() -> MethodInstance {
        let mut m = create_method("bundle", BundleMethod::default());
        let cfg = json!({ "parts": [ { "name": "a", "panels": ["1"] },
                                     { "name": "b", "panels": ["1", { "body": "2", "artifact": "gem" }] } ] });
        m.init(ContainerHandle::new("stage"), &cfg).expect("init");
        m.take_outbox();
        m
    }

    #[test]
    fn completes_when_every_part_is_done() {
        let mut m = bundle();
        assert_eq!(m.total_steps(), 2);
        assert_eq!(m.instance_names(), vec!["bundle".to_string(), "bundle/a".into(), "bundle/b".into()]);

        m.handle_input(&json!({ "part": "a", "action": "next" })).expect("a");
        assert_eq!(m.current_step(), 1);
        assert!(!m.is_complete());
        let out = m.take_outbox();
        assert!(out.iter().any(|e| e.kind == MethodEventKind::Complete && e.source == vec!["a".to_string()]));
        assert!(!out.iter().any(|e| e.kind == MethodEventKind::Complete && e.is_own()));

        m.handle_input(&json!({ "part": "b", "action": "revealAll" })).expect("b");
        assert!(m.is_complete());
        let out = m.take_outbox();
        assert!(out.iter().any(|e| e.kind == MethodEventKind::CollectArtifact && e.source == vec!["b".to_string()]));
        assert!(out.iter().any(|e| e.kind == MethodEventKind::Complete && e.is_own()));
    }

    #[test]
    fn unknown_part_is_rejected() {
        let mut m = bundle();
        let err = m.handle_input(&json!({ "part": "zz", "action": "next" })).unwrap_err();
        assert_eq!(err, MethodError::UnknownChild("zz".into()));
    }

    #[test]
    fn part_state_round_trips_through_restore() {
        let mut m = bundle();
        m.handle_input(&json!({ "part": "a", "action": "next" })).expect("a");
        let saved = m.get_state();
        assert_eq!(saved["parts"]["a"]["isComplete"], json!(true));

        let mut late = bundle();
        late.set_state(&saved);
        assert_eq!(late.current_step(), 1);
        assert_eq!(late.core().child("a").map(|c| c.is_complete()), Some(true));
        late.handle_input(&json!({ "part": "b", "action": "revealAll" })).expect("b");
        assert!(late.is_complete());

        let mut early = create_method("bundle", BundleMethod::default());
        early.set_state(&saved);
        let cfg = json!({ "parts": [ { "name": "a", "panels": ["1"] }, { "name": "b", "panels": ["1"] } ] });
        early.init(ContainerHandle::new("stage"), &cfg).expect("init");
        assert_eq!(early.core().child("a").map(|c| c.is_complete()), Some(true));
        early.handle_input(&json!({ "part": "b", "action": "next" })).expect("b");
        assert!(early.is_complete());
    }
}
