use chrono::{DateTime, Utc};

/// Fase del runner.
///
/// Las transiciones válidas son:
/// - `Idle` -> `AwaitingStart` (`load_lesson`)
/// - `AwaitingStart` -> `Transitioning` (`begin` o restore)
/// - `Transitioning` -> `Active` (al vencer el cooldown)
/// - `Active` -> `Transitioning` | `Finished`
///
/// `Finished` es terminal hasta el próximo `load_lesson`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    /// Sin lección cargada.
    Idle,
    /// Lección cargada, índice -1, esperando el gesto de apertura.
    AwaitingStart,
    /// Se acaba de entrar a `index`; nuevas peticiones se descartan hasta `until`.
    Transitioning { index: usize, until: DateTime<Utc> },
    /// Módulo `index` activo y aceptando navegación.
    Active { index: usize },
    /// Índice == número de módulos.
    Finished,
}

impl RunnerPhase {
    pub fn module_index(&self) -> Option<usize> {
        match self {
            RunnerPhase::Transitioning { index, .. } | RunnerPhase::Active { index } => Some(*index),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunnerPhase::Finished)
    }
}
