use std::fmt;

use crate::errors::CoreEngineError;

/// Motivo por el que una petición de navegación se descartó.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotLoaded,
    /// Falta el gesto de apertura (`begin`).
    AwaitingStart,
    /// `begin` llegó cuando ya había un módulo en curso.
    AlreadyStarted,
    /// Otra transición sigue dentro del cooldown.
    InFlight,
    Finished,
    OutOfRange(i64),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotLoaded => f.write_str("not-loaded"),
            DropReason::AwaitingStart => f.write_str("awaiting-start"),
            DropReason::AlreadyStarted => f.write_str("already-started"),
            DropReason::InFlight => f.write_str("in-flight"),
            DropReason::Finished => f.write_str("finished"),
            DropReason::OutOfRange(i) => write!(f, "out-of-range({i})"),
        }
    }
}

/// Resultado de una petición de navegación. Nunca se propaga como error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome {
    Entered { from: i64, to: usize },
    Finished,
    /// Descartada sin efectos (no se encola).
    Dropped(DropReason),
    /// Abortada por configuración; el índice no cambió.
    Aborted(CoreEngineError),
    /// Restore sin navegación (índice -1 o módulo ya inexistente).
    Unchanged,
}

impl NavOutcome {
    /// `true` si cambió el índice.
    pub fn moved(&self) -> bool {
        matches!(self, NavOutcome::Entered { .. } | NavOutcome::Finished)
    }
}
