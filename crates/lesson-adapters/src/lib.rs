//! lesson-adapters: métodos de enseñanza de referencia.
//!
//! Este crate provee:
//! - `RevealMethod`: paneles que se descubren uno a uno (`progressive-disclosure`).
//! - `ScenarioMethod`: árbol de decisiones con nodos terminales (`scenario`).
//! - `BundleMethod`: compuesto de varios reveals hijos (`bundle`).
//! - `register_builtin` para dar de alta los tres (y sus alias heredados)
//!   en un `MethodRegistry`.
//!
//! Nota: el core no conoce ninguno de estos tipos; sólo ve `MethodInstance`.

pub mod builtin;
pub mod methods;

pub use builtin::{register_builtin, BUNDLE, PROGRESSIVE_DISCLOSURE, SCENARIO};
