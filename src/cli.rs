//! Argumentos de `lessonflow play`.
//!
//! Parser manual: `play <manifest> [--script F] [--state-dir D] [--inject F] [--fresh] [--no-autosave]`.

use crate::errors::AppError;

pub const USAGE: &str = "uso: lessonflow play <manifest.json> [--script <archivo>] [--state-dir <dir>] \
                         [--inject <snapshot.json>] [--fresh] [--no-autosave]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayArgs {
    pub manifest_path: String,
    pub script_path: Option<String>,
    pub inject_path: Option<String>,
    pub state_dir: Option<String>,
    pub fresh: bool,
    /// `Some(false)` con `--no-autosave`; `None` deja el valor de `CONFIG`.
    pub autosave: Option<bool>,
}

impl PlayArgs {
    /// `Ok(None)` cuando no es una invocación de `play` (se imprime el uso).
    pub fn parse(args: &[String]) -> Result<Option<Self>, AppError> {
        if args.len() < 3 || args[1] != "play" {
            return Ok(None);
        }
        let mut parsed = PlayArgs { manifest_path: args[2].clone(),
                                    ..Default::default() };
        let mut rest = args[3..].iter();
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--script" => parsed.script_path = Some(value_for(arg, rest.next())?),
                "--inject" => parsed.inject_path = Some(value_for(arg, rest.next())?),
                "--state-dir" => parsed.state_dir = Some(value_for(arg, rest.next())?),
                "--fresh" => parsed.fresh = true,
                "--no-autosave" => parsed.autosave = Some(false),
                other => return Err(AppError::Config(format!("argumento desconocido '{other}'"))),
            }
        }
        Ok(Some(parsed))
    }
}

fn value_for(flag: &str, value: Option<&String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.starts_with("--") => Ok(v.clone()),
        _ => Err(AppError::Config(format!("falta el valor de '{flag}'"))),
    }
}
