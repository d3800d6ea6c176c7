//! Carga de configuración de almacenamiento desde variables de entorno.
//! Convención `LESSON_*`; todo tiene valor por defecto.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use lesson_core::constants::DEFAULT_SNAPSHOT_KEY;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

pub const DEFAULT_STATE_DIR: &str = ".lesson-state";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub state_dir: PathBuf,
    pub snapshot_key: String,
    /// Reintentos ante errores de IO transitorios al escribir.
    pub write_retries: u32,
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let state_dir = env::var("LESSON_STATE_DIR").map(PathBuf::from)
                                                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));
        let snapshot_key = env::var("LESSON_SNAPSHOT_KEY").ok()
                                                          .filter(|k| !k.trim().is_empty())
                                                          .unwrap_or_else(|| DEFAULT_SNAPSHOT_KEY.to_string());
        let write_retries = env::var("LESSON_STORE_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(2);
        Self { state_dir, snapshot_key, write_retries }
    }

    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Directorio del journal de eventos, dentro de `state_dir`.
    pub fn journal_dir(&self) -> PathBuf {
        self.state_dir.join("journal")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { state_dir: PathBuf::from(DEFAULT_STATE_DIR),
               snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
               write_retries: 2 }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
