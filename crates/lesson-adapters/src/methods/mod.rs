pub mod bundle;
pub mod reveal;
pub mod scenario;

pub use bundle::BundleMethod;
pub use reveal::{Panel, RevealConfig, RevealMethod};
pub use scenario::{ScenarioConfig, ScenarioMethod, ScenarioNode};

use lesson_core::MethodError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Parsea la config de un módulo (`Null` cuenta como objeto vacío).
pub(crate) fn parse_config<T: DeserializeOwned>(options: &Value) -> Result<T, MethodError> {
    let raw = if options.is_null() { Value::Object(Default::default()) } else { options.clone() };
    serde_json::from_value(raw).map_err(|e| MethodError::InvalidConfig(e.to_string()))
}

pub(crate) fn parse_input<T: DeserializeOwned>(input: &Value) -> Result<T, MethodError> {
    serde_json::from_value(input.clone()).map_err(|e| MethodError::InvalidInput(e.to_string()))
}
