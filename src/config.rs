//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable (`CONFIG`).
//! Reúne los tiempos del runner, el autosave y la configuración del store.
use std::env;

use lesson_core::constants::{DEFAULT_SETTLE_DELAY_MS, DEFAULT_TRANSITION_COOLDOWN_MS};
use lesson_core::RunnerConfig;
use lesson_persistence::StoreConfig;
use once_cell::sync::Lazy;

/// Configuración global de la aplicación.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub transition_cooldown_ms: i64,
    pub settle_delay_ms: i64,
    /// Guardar snapshot tras cada entrada a módulo.
    pub autosave: bool,
    pub store: StoreConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        lesson_persistence::init_dotenv();
        let transition_cooldown_ms = env_i64("LESSON_TRANSITION_COOLDOWN_MS").unwrap_or(DEFAULT_TRANSITION_COOLDOWN_MS);
        let settle_delay_ms = env_i64("LESSON_SETTLE_DELAY_MS").unwrap_or(DEFAULT_SETTLE_DELAY_MS);
        let autosave = env::var("LESSON_AUTOSAVE").ok().and_then(|v| parse_flag(&v)).unwrap_or(true);
        Self { transition_cooldown_ms,
               settle_delay_ms,
               autosave,
               store: StoreConfig::from_env() }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::from_millis(self.transition_cooldown_ms, self.settle_delay_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { transition_cooldown_ms: DEFAULT_TRANSITION_COOLDOWN_MS,
               settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
               autosave: true,
               store: StoreConfig::default() }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

fn env_i64(name: &str) -> Option<i64> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok()).filter(|v: &i64| *v >= 0)
}

/// `1/true/yes/on` y `0/false/no/off`, sin distinguir mayúsculas.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
