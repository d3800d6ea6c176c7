//! Tipos del manifest: documento declarativo de una lección.
//!
//! El manifest es inmutable durante la sesión una vez cargado. `config` de
//! cada módulo es un payload JSON opaco para el core; sólo el handler
//! registrado para `type` lo interpreta.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tema visual aplicado al cargar la lección.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_body: Option<String>,
}

/// Condición que dispara la colección de un artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    /// Lo solicita el handler (o la UI) explícitamente.
    #[default]
    Manual,
    /// Al completarse el módulo que lo declara.
    OnStepComplete,
    /// Al entrar al módulo que lo declara.
    OnModuleEnter,
}

/// Coleccionable declarado por la lección o por un módulo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSpec {
    /// Identificador único dentro de la lección.
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger: Trigger,
    /// Sub-ids descriptivos; el registry nunca deriva el compuesto a partir de ellos.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<String>,
}

impl ArtifactSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(),
               label: String::new(),
               icon: String::new(),
               description: String::new(),
               trigger: Trigger::Manual,
               fragments: Vec::new() }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_fragments<I, S>(mut self, fragments: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }
}

/// Acción opcional ejecutada al entrar a un módulo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum OnEnterAction {
    /// Solicita la colección de un artifact declarado.
    CollectArtifact { id: String },
    /// Señal libre reenviada al host a través del journal.
    Signal {
        name: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Un módulo secuenciado de la lección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSpec {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Tag del tipo de método; se resuelve contra el `MethodRegistry`.
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(default, alias = "content")]
    pub config: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter: Option<OnEnterAction>,
}

impl ModuleSpec {
    pub fn new(id: impl Into<String>, method_type: impl Into<String>) -> Self {
        Self { id: id.into(),
               title: String::new(),
               method_type: method_type.into(),
               config: Value::Null,
               artifacts: Vec::new(),
               on_enter: None }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn with_artifact(mut self, spec: ArtifactSpec) -> Self {
        self.artifacts.push(spec);
        self
    }

    pub fn with_on_enter(mut self, action: OnEnterAction) -> Self {
        self.on_enter = Some(action);
        self
    }

    /// Artifacts del módulo cuyo trigger coincide.
    pub fn artifacts_with(&self, trigger: Trigger) -> impl Iterator<Item = &ArtifactSpec> {
        self.artifacts.iter().filter(move |a| a.trigger == trigger)
    }
}

/// Documento de la lección.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub theme: Theme,
    pub modules: Vec<ModuleSpec>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSpec>,
}
