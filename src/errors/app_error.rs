use lesson_core::CoreEngineError;
use lesson_persistence::PersistenceError;
use thiserror::Error;

/// Errores del binario y de la capa de aplicación.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("Manifest inválido: {0}")]
    Manifest(#[from] CoreEngineError),
    #[error("Error de persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Script inválido: {0}")]
    Script(String),
    #[error("Error de serialización: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Código de salida del proceso.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Script(_) => 2,
            AppError::Manifest(_) => 3,
            AppError::Io(_) | AppError::Persistence(_) | AppError::Json(_) => 5,
        }
    }
}
