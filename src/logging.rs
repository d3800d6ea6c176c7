//! Inicialización de logs para el binario.
//!
//! Las librerías del workspace emiten por la fachada `log`; el subscriber de
//! `tracing-subscriber` los recoge a través de su puente `tracing-log`.
//! Filtro por `RUST_LOG`, por defecto `info`. Salida a stderr para no
//! mezclarse con los mensajes al host en stdout.

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global. Devuelve `false` si ya había uno.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
                             .with_writer(std::io::stderr)
                             .try_init()
                             .is_ok()
}
