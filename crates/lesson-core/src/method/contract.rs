use serde_json::{Map, Value};

use super::MethodCore;
use crate::errors::MethodError;

/// Hooks que un tipo de método aporta sobre el contrato base.
///
/// El `MethodInstance` gestiona contadores, eventos, hijos y ciclo de vida;
/// el behavior sólo recibe el `MethodCore` para actuar sobre ellos. Todos los
/// hooks tienen implementación vacía por defecto.
pub trait MethodBehavior: std::fmt::Debug {
    /// Se ejecuta dentro de `init`, con el contenedor ya fijado. Aquí suele
    /// configurarse `total_steps` y crearse los hijos.
    fn on_init(&mut self, core: &mut MethodCore, options: &Value) -> Result<(), MethodError> {
        let _ = (core, options);
        Ok(())
    }

    /// Input del aprendiz reenviado por el host.
    fn on_input(&mut self, core: &mut MethodCore, input: &Value) -> Result<(), MethodError> {
        let _ = (core, input);
        Ok(())
    }

    fn on_reset(&mut self, core: &mut MethodCore) {
        let _ = core;
    }

    fn on_destroy(&mut self, core: &mut MethodCore) {
        let _ = core;
    }

    /// Campos propios que se fusionan con el estado base en `get_state`.
    fn state(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Recibe el estado guardado completo (base + campos propios).
    fn apply_state(&mut self, core: &mut MethodCore, saved: &Map<String, Value>) {
        let _ = (core, saved);
    }
}

/// Behavior sin lógica propia; útil para contenedores puramente compuestos.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passive;

impl MethodBehavior for Passive {}
