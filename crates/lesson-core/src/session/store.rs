//! Puertos de persistencia del snapshot y del canal hacia el host.
//!
//! Ambos son best-effort: un fallo se registra y la sesión continúa.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")] Unavailable(String),
    #[error("io error: {0}")] Io(String),
    #[error("invalid key '{0}'")] InvalidKey(String),
    #[error("host channel closed")] ChannelClosed,
}

/// Almacenamiento clave/valor del snapshot serializado.
pub trait SnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;
}

/// Origen del estado aplicado en el arranque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoverySource {
    /// Snapshot entregado por el host (handoff de un solo uso).
    Injected,
    Persisted,
    Cold,
}

/// Mensajes salientes hacia la página/proceso anfitrión.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    SnapshotSaved { lesson_id: String, timestamp: DateTime<Utc>, progress: f64, engine_version: String },
    SessionRestored { source: RecoverySource, active_module_index: i64 },
}

pub trait HostChannel {
    fn post(&mut self, message: &HostMessage) -> Result<(), StoreError>;
}

/// Store en memoria. Los clones comparten el mismo mapa.
#[derive(Debug, Default, Clone)]
pub struct InMemorySnapshotStore {
    inner: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.inner.borrow_mut().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.borrow_mut().remove(key).is_some())
    }
}

/// Descarta todos los mensajes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHostChannel;

impl HostChannel for NullHostChannel {
    fn post(&mut self, _message: &HostMessage) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Canal que acumula los mensajes; los clones comparten el log.
#[derive(Debug, Default, Clone)]
pub struct RecordingHostChannel {
    log: Rc<RefCell<Vec<HostMessage>>>,
}

impl RecordingHostChannel {
    pub fn messages(&self) -> Vec<HostMessage> {
        self.log.borrow().clone()
    }
}

impl HostChannel for RecordingHostChannel {
    fn post(&mut self, message: &HostMessage) -> Result<(), StoreError> {
        self.log.borrow_mut().push(message.clone());
        Ok(())
    }
}
