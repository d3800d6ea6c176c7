//! RevealMethod (progressive disclosure)
//!
//! - Config: `{ "panels": [ "texto", { "title": ..., "body": ..., "artifact": ... } ] }`.
//! - Un paso por panel; input `{ "action": "next" }` descubre el siguiente.
//! - Al descubrir el último panel el método se marca completo.
//! - Un panel con `artifact` solicita su colección al descubrirse.

use lesson_core::{MethodBehavior, MethodCore, MethodError};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{parse_config, parse_input};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Panel {
    Text(String),
    Rich {
        #[serde(default)]
        title: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        artifact: Option<String>,
    },
}

impl Panel {
    pub fn artifact(&self) -> Option<&str> {
        match self {
            Panel::Text(_) => None,
            Panel::Rich { artifact, .. } => artifact.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RevealConfig {
    #[serde(default)]
    pub panels: Vec<Panel>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum RevealInput {
    Next,
    /// Descubre todo lo pendiente de una vez.
    RevealAll,
}

#[derive(Debug, Default)]
pub struct RevealMethod {
    panels: Vec<Panel>,
}

impl RevealMethod {
    fn reveal_one(&self, core: &mut MethodCore) -> bool {
        if !core.advance_step() {
            return false;
        }
        let shown = core.current_step() as usize;
        if let Some(id) = self.panels.get(shown - 1).and_then(Panel::artifact) {
            core.request_artifact(id);
        }
        if core.current_step() == core.total_steps() {
            core.mark_complete();
        }
        true
    }
}

impl MethodBehavior for RevealMethod {
    fn on_init(&mut self, core: &mut MethodCore, options: &Value) -> Result<(), MethodError> {
        let config: RevealConfig = parse_config(options)?;
        if config.panels.is_empty() {
            return Err(MethodError::InvalidConfig("reveal needs at least one panel".into()));
        }
        core.set_total_steps(config.panels.len() as u32);
        self.panels = config.panels;
        Ok(())
    }

    fn on_input(&mut self, core: &mut MethodCore, input: &Value) -> Result<(), MethodError> {
        match parse_input(input)? {
            RevealInput::Next => {
                self.reveal_one(core);
            }
            RevealInput::RevealAll => while self.reveal_one(core) {},
        }
        Ok(())
    }

    fn state(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("panelCount".into(), json!(self.panels.len()));
        m
    }

    /// Una vez inicializado, el número de paneles de la config manda sobre el
    /// `totalSteps` guardado.
    fn apply_state(&mut self, core: &mut MethodCore, _saved: &Map<String, Value>) {
        if !self.panels.is_empty() {
            core.set_total_steps(self.panels.len() as u32);
        }
    }
}
