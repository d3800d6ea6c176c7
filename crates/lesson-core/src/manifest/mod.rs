//! Manifest de lección: tipos, parseo y validación.
//!
//! `Manifest::from_json` es la única puerta de entrada desde JSON; valida las
//! invariantes estructurales que el runner asume (ids únicos, tags no
//! vacíos) y devuelve `CoreEngineError::InvalidManifest` si no se cumplen.

mod types;

pub use types::{ArtifactSpec, Manifest, ModuleSpec, OnEnterAction, Theme, Trigger};

use std::collections::HashSet;

use crate::errors::CoreEngineError;
use crate::hashing::{hash_str, hash_value};

impl Manifest {
    pub fn new(title: impl Into<String>, modules: Vec<ModuleSpec>) -> Self {
        Self { id: None,
               title: title.into(),
               description: String::new(),
               theme: Theme::default(),
               modules,
               artifacts: Vec::new() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_artifact(mut self, spec: ArtifactSpec) -> Self {
        self.artifacts.push(spec);
        self
    }

    /// Parsea y valida un manifest JSON.
    pub fn from_json(raw: &str) -> Result<Self, CoreEngineError> {
        let manifest: Manifest =
            serde_json::from_str(raw).map_err(|e| CoreEngineError::InvalidManifest(e.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Comprueba ids de módulos/artifacts únicos y no vacíos y tags presentes.
    pub fn validate(&self) -> Result<(), CoreEngineError> {
        let mut module_ids = HashSet::new();
        for (i, m) in self.modules.iter().enumerate() {
            if m.id.trim().is_empty() {
                return Err(CoreEngineError::InvalidManifest(format!("module #{i} has an empty id")));
            }
            if m.method_type.trim().is_empty() {
                return Err(CoreEngineError::InvalidManifest(format!("module '{}' has an empty type", m.id)));
            }
            if !module_ids.insert(m.id.as_str()) {
                return Err(CoreEngineError::InvalidManifest(format!("duplicate module id '{}'", m.id)));
            }
        }
        let mut artifact_ids = HashSet::new();
        for a in self.all_artifacts() {
            if a.id.trim().is_empty() {
                return Err(CoreEngineError::InvalidManifest("artifact with empty id".into()));
            }
            if !artifact_ids.insert(a.id.as_str()) {
                return Err(CoreEngineError::InvalidManifest(format!("duplicate artifact id '{}'", a.id)));
            }
        }
        Ok(())
    }

    /// Todos los artifacts declarados: primero los de la lección, luego los
    /// de cada módulo en orden.
    pub fn all_artifacts(&self) -> impl Iterator<Item = &ArtifactSpec> {
        self.artifacts.iter().chain(self.modules.iter().flat_map(|m| m.artifacts.iter()))
    }

    pub fn module(&self, index: usize) -> Option<&ModuleSpec> {
        self.modules.get(index)
    }

    pub fn module_index(&self, module_id: &str) -> Option<usize> {
        self.modules.iter().position(|m| m.id == module_id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Hash blake3 del JSON canónico del manifest.
    pub fn fingerprint(&self) -> String {
        serde_json::to_value(self).map(|v| hash_value(&v))
                                  .unwrap_or_else(|_| hash_str(&self.title))
    }

    /// `id` explícito o, si falta, el fingerprint.
    pub fn lesson_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.fingerprint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_manifest() -> serde_json::Value {
        json!({
            "title": "Photosynthesis",
            "theme": { "primaryColor": "#2a7", "fontBody": "Inter" },
            "modules": [
                { "id": "intro", "title": "Intro", "type": "progressive-disclosure",
                  "content": { "panels": ["a", "b"] } },
                { "id": "quiz", "title": "Quiz", "type": "scenario",
                  "config": { "start": "q1" },
                  "artifacts": [ { "id": "leaf", "label": "Leaf", "trigger": "onStepComplete" } ],
                  "onEnter": { "action": "signal", "name": "ambience", "payload": { "track": "forest" } } }
            ],
            "artifacts": [ { "id": "sun", "label": "Sun", "fragments": ["ray-1", "ray-2"] } ]
        })
    }

    #[test]
    fn parses_content_alias_and_on_enter() {
        let m = Manifest::from_json(&raw_manifest().to_string()).expect("valid manifest");
        assert_eq!(m.modules[0].config, json!({ "panels": ["a", "b"] }));
        assert_eq!(m.modules[1].artifacts[0].trigger, Trigger::OnStepComplete);
        assert!(matches!(&m.modules[1].on_enter, Some(OnEnterAction::Signal { name, .. }) if name == "ambience"));
        assert_eq!(m.theme.primary_color.as_deref(), Some("#2a7"));
        assert_eq!(m.all_artifacts().count(), 2);
    }

    #[test]
    fn duplicate_module_ids_are_rejected() {
        let mut raw = raw_manifest();
        raw["modules"][1]["id"] = json!("intro");
        let err = Manifest::from_json(&raw.to_string()).unwrap_err();
        assert!(matches!(err, CoreEngineError::InvalidManifest(msg) if msg.contains("intro")));
    }

    #[test]
    fn duplicate_artifact_ids_across_scopes_are_rejected() {
        let mut raw = raw_manifest();
        raw["artifacts"][0]["id"] = json!("leaf");
        assert!(Manifest::from_json(&raw.to_string()).is_err());
    }

    #[test]
    fn lesson_id_falls_back_to_fingerprint() {
        let m = Manifest::from_json(&raw_manifest().to_string()).expect("valid manifest");
        assert_eq!(m.lesson_id(), m.fingerprint());
        assert_eq!(m.lesson_id().len(), 64);
        let with_id = m.clone().with_id("bio-101");
        assert_eq!(with_id.lesson_id(), "bio-101");
    }
}
