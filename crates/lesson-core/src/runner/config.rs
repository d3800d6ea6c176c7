use chrono::Duration;

use crate::constants::{DEFAULT_SETTLE_DELAY_MS, DEFAULT_TRANSITION_COOLDOWN_MS, MAX_RUNNER_DELAY_MS};

/// Tiempos de secuenciación del runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Ventana tras una transición durante la cual se descarta navegación.
    pub transition_cooldown: Duration,
    /// Espera entre `Complete` y el auto-avance.
    pub settle_delay: Duration,
}

impl RunnerConfig {
    /// Valores fuera de `0..=MAX_RUNNER_DELAY_MS` se acotan.
    pub fn from_millis(cooldown_ms: i64, settle_ms: i64) -> Self {
        Self { transition_cooldown: Duration::milliseconds(cooldown_ms.clamp(0, MAX_RUNNER_DELAY_MS)),
               settle_delay: Duration::milliseconds(settle_ms.clamp(0, MAX_RUNNER_DELAY_MS)) }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TRANSITION_COOLDOWN_MS, DEFAULT_SETTLE_DELAY_MS)
    }
}
