//! Errores de persistencia.
//! Mapea errores de IO / serde a variantes semánticas y éstas a `StoreError`
//! del core.

use std::io;

use lesson_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("not found")]
    NotFound,
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("transient IO error: {0}")]
    TransientIo(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("corrupt record at {path}:{line}: {msg}")]
    Corrupt { path: String, line: usize, msg: String },
}

impl PersistenceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientIo(_))
    }
}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
                Self::TransientIo(err.to_string())
            }
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::InvalidKey(k) => StoreError::InvalidKey(k),
            PersistenceError::TransientIo(m) => StoreError::Unavailable(m),
            other => StoreError::Io(other.to_string()),
        }
    }
}
