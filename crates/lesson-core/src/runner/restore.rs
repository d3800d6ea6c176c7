//! Protocolo de restore en dos fases.
//!
//! El `SessionStateManager` construye un `RestorePlan` con el índice destino
//! y un token por módulo guardado. El runner entrega el token del módulo al
//! instance justo después de su `init` (`set_state`); los tokens de módulos
//! que todavía no se inicializaron se conservan hasta su primera entrada y se
//! consumen una sola vez.
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreToken {
    pub module_id: String,
    pub state: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestorePlan {
    /// -1 = no iniciado, N = terminado.
    pub index: i64,
    pub tokens: Vec<RestoreToken>,
}
