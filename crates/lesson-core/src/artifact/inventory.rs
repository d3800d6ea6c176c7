//! Colaborador de UI del inventario.
//!
//! El registry lo notifica de forma síncrona y fire-and-forget; el core no
//! espera respuesta ni maneja errores de la UI.
use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::manifest::ArtifactSpec;

/// Regla de desbloqueo por umbral (p.ej. una pista de ambiente al colectar N).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRule {
    pub at_count: usize,
    pub reward: String,
}

impl UnlockRule {
    pub fn new(at_count: usize, reward: impl Into<String>) -> Self {
        Self { at_count,
               reward: reward.into() }
    }
}

pub trait InventoryUi {
    fn add_artifact(&mut self, id: &str, spec: &ArtifactSpec);
    fn unlock_artifact(&mut self, id: &str);
    fn threshold_reached(&mut self, rule: &UnlockRule) {
        let _ = rule;
    }
}

/// Inventario sin UI.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullInventory;

impl InventoryUi for NullInventory {
    fn add_artifact(&mut self, _id: &str, _spec: &ArtifactSpec) {}
    fn unlock_artifact(&mut self, _id: &str) {}
}

/// Llamada registrada por `RecordingInventory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryCall {
    Added(String),
    Unlocked(String),
    Threshold(String),
}

/// Inventario que registra cada notificación. Los clones comparten el log,
/// así el host (o un test) conserva un handle tras entregarlo al registry.
#[derive(Debug, Default, Clone)]
pub struct RecordingInventory {
    log: Rc<RefCell<Vec<InventoryCall>>>,
}

impl RecordingInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<InventoryCall> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl InventoryUi for RecordingInventory {
    fn add_artifact(&mut self, id: &str, _spec: &ArtifactSpec) {
        self.log.borrow_mut().push(InventoryCall::Added(id.to_string()));
    }

    fn unlock_artifact(&mut self, id: &str) {
        self.log.borrow_mut().push(InventoryCall::Unlocked(id.to_string()));
    }

    fn threshold_reached(&mut self, rule: &UnlockRule) {
        self.log.borrow_mut().push(InventoryCall::Threshold(rule.reward.clone()));
    }
}
