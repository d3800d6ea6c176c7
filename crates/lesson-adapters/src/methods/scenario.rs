//! ScenarioMethod (árbol de decisiones)
//!
//! Config:
//!
//! ```json
//! { "start": "door",
//!   "nodes": { "door": { "text": "...", "choices": [ { "label": "open", "goto": "hall" } ] },
//!              "hall": { "text": "...", "artifact": "lamp" } } }
//! ```
//!
//! Cada elección avanza un paso. Un nodo sin `choices` es terminal: fija
//! `total_steps` al camino recorrido, solicita su `artifact` si lo tiene y
//! marca el método completo.

use std::collections::BTreeMap;

use lesson_core::{MethodBehavior, MethodCore, MethodError};
use log::debug;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_config, parse_input};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub label: String,
    pub goto: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioNode {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub artifact: Option<String>,
}

impl ScenarioNode {
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScenarioConfig {
    pub start: String,
    pub nodes: BTreeMap<String, ScenarioNode>,
}

impl ScenarioConfig {
    /// Todo `goto` y el nodo inicial deben existir.
    fn validate(&self) -> Result<(), MethodError> {
        if !self.nodes.contains_key(&self.start) {
            return Err(MethodError::InvalidConfig(format!("start node '{}' not found", self.start)));
        }
        for (id, node) in &self.nodes {
            if let Some(c) = node.choices.iter().find(|c| !self.nodes.contains_key(&c.goto)) {
                return Err(MethodError::InvalidConfig(format!("node '{id}' points to unknown node '{}'", c.goto)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ChoiceInput {
    choice: usize,
}

#[derive(Debug, Default)]
pub struct ScenarioMethod {
    config: ScenarioConfig,
    current: String,
    path: Vec<String>,
}

impl ScenarioMethod {
    pub fn current_node(&self) -> Option<&ScenarioNode> {
        self.config.nodes.get(&self.current)
    }

    fn enter(&mut self, core: &mut MethodCore, node_id: String) {
        debug!("scenario:enter node={node_id}");
        self.current = node_id.clone();
        self.path.push(node_id);
        let Some(node) = self.config.nodes.get(&self.current) else {
            return;
        };
        if node.is_terminal() {
            let artifact = node.artifact.clone();
            core.set_total_steps(core.current_step());
            if let Some(id) = artifact {
                core.request_artifact(&id);
            }
            core.mark_complete();
        }
    }
}

impl MethodBehavior for ScenarioMethod {
    fn on_init(&mut self, core: &mut MethodCore, options: &Value) -> Result<(), MethodError> {
        let config: ScenarioConfig = parse_config(options)?;
        config.validate()?;
        // cota superior: cada nodo no terminal se visita como mucho una vez por camino
        let upper = config.nodes.values().filter(|n| !n.is_terminal()).count().max(1);
        core.set_total_steps(upper as u32);
        let start = config.start.clone();
        self.config = config;
        if self.current.is_empty() {
            self.enter(core, start);
        } else if !self.config.nodes.contains_key(&self.current) {
            debug!("scenario:saved-node-gone node={}", self.current);
            self.current.clear();
            self.path.clear();
            self.enter(core, start);
        }
        Ok(())
    }

    fn on_input(&mut self, core: &mut MethodCore, input: &Value) -> Result<(), MethodError> {
        let ChoiceInput { choice } = parse_input(input)?;
        let node = self.current_node()
                       .ok_or_else(|| MethodError::InvalidInput(format!("no current node '{}'", self.current)))?;
        let target = node.choices
                         .get(choice)
                         .map(|c| c.goto.clone())
                         .ok_or_else(|| MethodError::InvalidInput(format!("choice {choice} out of range")))?;
        core.advance_step();
        self.enter(core, target);
        Ok(())
    }

    fn on_reset(&mut self, core: &mut MethodCore) {
        self.path.clear();
        let start = self.config.start.clone();
        let upper = self.config.nodes.values().filter(|n| !n.is_terminal()).count().max(1);
        core.set_total_steps(upper as u32);
        self.enter(core, start);
    }

    fn state(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("node".into(), json!(self.current));
        m.insert("path".into(), json!(self.path));
        m
    }

    fn apply_state(&mut self, _core: &mut MethodCore, saved: &Map<String, Value>) {
        if let Some(node) = saved.get("node").and_then(Value::as_str) {
            self.current = node.to_string();
        }
        if let Some(path) = saved.get("path").and_then(Value::as_array) {
            self.path = path.iter().filter_map(Value::as_str).map(str::to_string).collect();
        }
    }
}
