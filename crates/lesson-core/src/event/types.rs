//! Tipos de evento del runner y estructura `LessonEvent`.
//!
//! Rol en la sesión:
//! - Cada operación del `LessonRunner` deja constancia en un `EventStore`
//!   append-only (el journal).
//! - El host lo consulta para reaccionar (tema, señales de `onEnter`,
//!   fin de lección) sin acoplarse al estado interno del runner.
//! - El enum `LessonEventKind` es el contrato observable y estable del runner.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::CoreEngineError;
use crate::manifest::Theme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LessonEventKind {
    /// Manifest aceptado. Invariante: precede a cualquier otro evento de la
    /// lección.
    LessonLoaded { lesson_id: String, module_count: usize },
    ThemeApplied { theme: Theme },
    /// A la espera del gesto de apertura.
    AwaitingStart,
    /// Gesto de apertura recibido; a continuación se entra al módulo 0.
    Ready,
    ModuleEntered { index: usize, module_id: String },
    ModuleExited { index: usize, module_id: String },
    /// El instance activo publicó su propio `Complete`.
    ModuleCompleted { index: usize, module_id: String },
    AdvanceScheduled { index: usize, due: DateTime<Utc> },
    /// Petición de navegación descartada (no encolada).
    TransitionDropped { requested: i64, reason: String },
    /// Transición abortada por error de configuración; el índice no cambió.
    TransitionAborted { requested: i64, error: CoreEngineError },
    /// Solicitud de colección enviada al registry de artifacts.
    ArtifactRequested { artifact_id: String },
    /// Señal de `onEnter` para el host.
    Signal { module_id: String, name: String, payload: Value },
    RestoreApplied { index: i64 },
    /// Estado terminal; se emite una única vez por lección.
    LessonFinished,
}

impl LessonEventKind {
    /// Letra compacta para aserciones de secuencia.
    pub fn code(&self) -> &'static str {
        match self {
            LessonEventKind::LessonLoaded { .. } => "L",
            LessonEventKind::ThemeApplied { .. } => "T",
            LessonEventKind::AwaitingStart => "W",
            LessonEventKind::Ready => "R",
            LessonEventKind::ModuleEntered { .. } => "E",
            LessonEventKind::ModuleExited { .. } => "X",
            LessonEventKind::ModuleCompleted { .. } => "C",
            LessonEventKind::AdvanceScheduled { .. } => "S",
            LessonEventKind::TransitionDropped { .. } => "D",
            LessonEventKind::TransitionAborted { .. } => "A",
            LessonEventKind::ArtifactRequested { .. } => "P",
            LessonEventKind::Signal { .. } => "G",
            LessonEventKind::RestoreApplied { .. } => "Z",
            LessonEventKind::LessonFinished => "F",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonEvent {
    pub seq: u64, // asignado por el EventStore (orden append)
    pub session_id: Uuid,
    pub kind: LessonEventKind,
    pub ts: DateTime<Utc>,
}
