//! Registro de coleccionables: specs declaradas + conjunto colectado.
//!
//! Invariante: el conjunto colectado es siempre un subconjunto de la unión de
//! specs registradas en la sesión. `collect` es idempotente porque la UI
//! puede disparar el mismo evento dos veces; los rechazos son tráfico
//! esperado y no errores.
use std::collections::HashSet;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use super::{InventoryUi, NullInventory, UnlockRule};
use crate::manifest::ArtifactSpec;

/// Resultado de `collect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    Collected,
    /// El id no corresponde a ninguna spec registrada.
    Unknown,
    /// Ya estaba colectado.
    Duplicate,
}

pub struct ArtifactRegistry {
    specs: IndexMap<String, ArtifactSpec>,
    collected: IndexSet<String>,
    rules: Vec<UnlockRule>,
    fired: HashSet<usize>,
    inventory: Box<dyn InventoryUi>,
}

impl ArtifactRegistry {
    pub fn new(inventory: Box<dyn InventoryUi>) -> Self {
        Self { specs: IndexMap::new(),
               collected: IndexSet::new(),
               rules: Vec::new(),
               fired: HashSet::new(),
               inventory }
    }

    pub fn with_rules(mut self, rules: Vec<UnlockRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn add_rule(&mut self, rule: UnlockRule) {
        self.rules.push(rule);
    }

    /// Registra specs (lección o módulo). Una spec con id ya conocido
    /// reemplaza los metadatos pero no altera el conjunto colectado.
    pub fn register_specs<'a, I>(&mut self, specs: I) -> usize
        where I: IntoIterator<Item = &'a ArtifactSpec>
    {
        let mut added = 0;
        for spec in specs {
            if self.specs.insert(spec.id.clone(), spec.clone()).is_none() {
                added += 1;
            }
        }
        debug!("register_specs:added={added} total={}", self.specs.len());
        added
    }

    pub fn spec(&self, id: &str) -> Option<&ArtifactSpec> {
        self.specs.get(id)
    }

    pub fn specs(&self) -> impl Iterator<Item = &ArtifactSpec> {
        self.specs.values()
    }

    /// Colecta `id` si está registrado y aún no colectado.
    pub fn collect(&mut self, id: &str) -> CollectOutcome {
        let Some(spec) = self.specs.get(id) else {
            debug!("collect:rejected id={id} reason=unknown");
            return CollectOutcome::Unknown;
        };
        if self.collected.contains(id) {
            debug!("collect:rejected id={id} reason=duplicate");
            return CollectOutcome::Duplicate;
        }
        self.collected.insert(id.to_string());
        self.inventory.add_artifact(id, spec);
        self.inventory.unlock_artifact(id);
        debug!("collect:done id={id} count={}", self.collected.len());
        self.check_thresholds();
        CollectOutcome::Collected
    }

    pub fn has(&self, id: &str) -> bool {
        self.collected.contains(id)
    }

    pub fn count(&self) -> usize {
        self.collected.len()
    }

    /// Ids colectados en orden de colección.
    pub fn collected_ids(&self) -> Vec<String> {
        self.collected.iter().cloned().collect()
    }

    /// Importación masiva (restore). Reemplaza el conjunto; ids sin spec se
    /// descartan con warning. Devuelve cuántos se aceptaron.
    pub fn set_collected_ids<I, S>(&mut self, ids: I) -> usize
        where I: IntoIterator<Item = S>,
              S: AsRef<str>
    {
        self.collected.clear();
        for id in ids {
            let id = id.as_ref();
            match self.specs.get(id) {
                Some(spec) => {
                    if self.collected.insert(id.to_string()) {
                        self.inventory.add_artifact(id, spec);
                        self.inventory.unlock_artifact(id);
                    }
                }
                None => warn!("set_collected_ids:dropped id={id} reason=unknown"),
            }
        }
        self.fired.clear();
        self.check_thresholds();
        self.collected.len()
    }

    /// Reset explícito: vacía lo colectado y rearma los umbrales.
    pub fn reset(&mut self) {
        self.collected.clear();
        self.fired.clear();
    }

    /// `(colectados, total)` de los fragmentos de una spec compuesta. Sólo
    /// informa; nunca colecta el compuesto.
    pub fn fragment_progress(&self, id: &str) -> Option<(usize, usize)> {
        let spec = self.specs.get(id)?;
        let have = spec.fragments.iter().filter(|f| self.collected.contains(f.as_str())).count();
        Some((have, spec.fragments.len()))
    }

    fn check_thresholds(&mut self) {
        let count = self.collected.len();
        for (i, rule) in self.rules.iter().enumerate() {
            if count >= rule.at_count && self.fired.insert(i) {
                debug!("threshold:reached at={} reward={}", rule.at_count, rule.reward);
                self.inventory.threshold_reached(rule);
            }
        }
    }
}

impl Default for ArtifactRegistry {
    fn default() -> Self {
        Self::new(Box::new(NullInventory))
    }
}

impl fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactRegistry")
         .field("specs", &self.specs.len())
         .field("collected", &self.collected)
         .field("rules", &self.rules)
         .finish()
    }
}
