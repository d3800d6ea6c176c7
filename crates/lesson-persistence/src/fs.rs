//! `SnapshotStore` sobre el sistema de archivos.
//!
//! Un archivo `<clave-saneada>.json` por clave dentro del directorio de
//! estado. La escritura va a un `.tmp` hermano y se renombra, de modo que un
//! lector nunca ve un snapshot a medias.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use lesson_core::{SnapshotStore, StoreError};
use log::{debug, warn};

use crate::config::StoreConfig;
use crate::error::PersistenceError;

#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    dir: PathBuf,
    retries: u32,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, retries: 2 })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, PersistenceError> {
        Ok(Self::new(&config.state_dir)?.with_retries(config.write_retries))
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Ruta del archivo de `key`. Los caracteres fuera de `[A-Za-z0-9._-]`
    /// se sustituyen por `_`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        let name: String = key.chars()
                              .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
                              .collect();
        if name.is_empty() || name.chars().all(|c| c == '.') {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{name}.json")))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
        let tmp = path.with_extension("json.tmp");
        with_retry(self.retries, || {
            fs::write(&tmp, bytes)?;
            fs::rename(&tmp, path)?;
            Ok(())
        })
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!("get:done path={} bytes={}", path.display(), bytes.len());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PersistenceError::from(e).into()),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        debug!("set:start path={} bytes={}", path.display(), value.len());
        self.write_atomic(&path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(PersistenceError::from(e).into()),
        }
    }
}

/// Retry simple con backoff lineal pequeño.
///
/// Política:
/// - Intentos extra: `retries`.
/// - Backoff: 15ms, 30ms, 45ms, ...
/// - Sólo errores `TransientIo`; el resto se devuelve tal cual.
pub(crate) fn with_retry<F, T>(retries: u32, mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if e.is_retryable() && attempts < retries => {
                let delay_ms = 15 * u64::from(attempts + 1);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sanitized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileSnapshotStore::new(dir.path()).expect("store");
        let p = store.path_for("lesson-player:snapshot").expect("path");
        assert_eq!(p.file_name().and_then(|n| n.to_str()), Some("lesson-player_snapshot.json"));
        assert!(matches!(store.path_for(""), Err(PersistenceError::InvalidKey(_))));
        assert!(matches!(store.path_for(".."), Err(PersistenceError::InvalidKey(_))));
    }

    #[test]
    fn retry_gives_up_after_budget() {
        let mut calls = 0;
        let r: Result<(), _> = with_retry(2, || {
            calls += 1;
            Err(PersistenceError::TransientIo("busy".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls, 3);

        let mut calls = 0;
        let r: Result<(), _> = with_retry(5, || {
            calls += 1;
            Err(PersistenceError::Io("disk".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls, 1);
    }
}
