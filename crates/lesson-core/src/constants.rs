//! Constantes del motor de lecciones.
//!
//! Los tiempos por defecto son sugerencias de secuenciación de la UI y no
//! garantías de correctitud; `RunnerConfig` permite sobreescribirlos.

/// Versión lógica del runner. Se publica al host junto a los snapshots.
pub const ENGINE_VERSION: &str = "L1.0";

/// Versión del esquema de `SessionSnapshot`. Un snapshot con otra versión
/// se considera malformado y se descarta.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Ventana durante la cual una transición se considera "en vuelo"; las
/// peticiones de navegación que llegan dentro de ella se descartan.
pub const DEFAULT_TRANSITION_COOLDOWN_MS: i64 = 600;

/// Espera entre la finalización de un módulo y el auto-avance.
pub const DEFAULT_SETTLE_DELAY_MS: i64 = 1200;

/// Tope para cooldown y settle delay configurados (una hora).
pub const MAX_RUNNER_DELAY_MS: i64 = 3_600_000;

/// Clave por defecto bajo la que se persiste el snapshot.
pub const DEFAULT_SNAPSHOT_KEY: &str = "lesson-player:snapshot";

/// Nombre del contenedor por defecto cuando el host no adjunta otro.
pub const DEFAULT_CONTAINER: &str = "lesson-stage";
