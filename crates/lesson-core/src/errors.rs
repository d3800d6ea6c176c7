//! Errores específicos del core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errores de configuración y navegación del runner. Serializable para que
/// pueda viajar dentro del journal (`TransitionAborted`).
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum CoreEngineError {
    #[error("no lesson loaded")] LessonNotLoaded,
    #[error("lesson already finished")] LessonFinished,
    #[error("invalid module index {0}")] InvalidModuleIndex(i64),
    #[error("no render target attached")] MissingRenderTarget,
    #[error("unresolved method type '{0}'")] UnresolvedMethodType(String),
    #[error("method init failed: {0}")] MethodInitFailed(String),
    #[error("invalid manifest: {0}")] InvalidManifest(String),
    #[error("internal: {0}")] Internal(String),
}

/// Errores del ciclo de vida de un `MethodInstance`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MethodError {
    #[error("invalid config: {0}")] InvalidConfig(String),
    #[error("invalid input: {0}")] InvalidInput(String),
    #[error("method '{0}' is not initialized")] NotInitialized(String),
    #[error("method '{0}' was destroyed")] Destroyed(String),
    #[error("no active method")] NoActiveMethod,
    #[error("unknown child '{0}'")] UnknownChild(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_survives_json() {
        let err = CoreEngineError::UnresolvedMethodType("quiz".into());
        let raw = serde_json::to_string(&err).expect("serialize");
        let back: CoreEngineError = serde_json::from_str(&raw).expect("deserialize");
        assert_eq!(back, err);
        assert_eq!(back.to_string(), "unresolved method type 'quiz'");
    }
}
