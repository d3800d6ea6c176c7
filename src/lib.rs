//! lessonflow
//!
//! Capa de aplicación sobre `lesson-core`:
//! - `cli`: argumentos de `lessonflow play`.
//! - `config`: configuración desde .env (`CONFIG`).
//! - `errors`: errores del binario.
//! - `logging`: subscriber de logs.
//! - `player`: reproductor headless guiado por script.
//!
//! El binario `lessonflow play` la usa; también puede usarse desde tests.

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod player;

pub use config::{AppConfig, CONFIG};
pub use errors::AppError;
pub use player::{play, PlayReport, Script, ScriptStep};
