//! Captura, persistencia y restauración de la sesión.
//!
//! Precedencia en `boot`: snapshot inyectado por el host > snapshot
//! persistido > arranque en frío. Una fuente malformada se descarta con
//! warning y se prueba la siguiente; como mucho se aplica una.

use std::fmt;
use std::rc::Rc;

use log::{debug, info, warn};

use super::snapshot::{progress_fraction, CourseProgress, InventoryState, NavigationState, SessionSnapshot,
                      SnapshotError};
use super::store::{HostChannel, HostMessage, NullHostChannel, RecoverySource, SnapshotStore};
use crate::artifact::ArtifactRegistry;
use crate::clock::Clock;
use crate::constants::{DEFAULT_SNAPSHOT_KEY, ENGINE_VERSION, SNAPSHOT_SCHEMA_VERSION};
use crate::event::EventStore;
use crate::runner::{LessonRunner, NavOutcome};

pub struct SessionStateManager {
    store: Box<dyn SnapshotStore>,
    host: Box<dyn HostChannel>,
    clock: Rc<dyn Clock>,
    key: String,
    injected: Option<Vec<u8>>,
}

impl SessionStateManager {
    pub fn new(store: Box<dyn SnapshotStore>, clock: Rc<dyn Clock>) -> Self {
        Self { store,
               host: Box::new(NullHostChannel),
               clock,
               key: DEFAULT_SNAPSHOT_KEY.to_string(),
               injected: None }
    }

    pub fn with_host(mut self, host: Box<dyn HostChannel>) -> Self {
        self.host = host;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Handoff del host. Se consume en el próximo `boot`.
    pub fn inject(&mut self, raw: impl Into<Vec<u8>>) {
        self.injected = Some(raw.into());
    }

    pub fn has_injected(&self) -> bool {
        self.injected.is_some()
    }

    /// Captura el estado actual. `None` si no hay lección cargada.
    pub fn snapshot<E: EventStore>(&self, runner: &LessonRunner<E>, artifacts: &ArtifactRegistry) -> Option<SessionSnapshot> {
        let manifest = runner.manifest()?;
        let index = runner.index();
        let finished = runner.is_finished();
        let mut modules = std::collections::BTreeMap::new();
        if let (Some(instance), Some(spec)) = (runner.active(), runner.active_module()) {
            modules.insert(spec.id.clone(), instance.get_state());
        }
        Some(SessionSnapshot { timestamp: self.clock.now(),
                               schema_version: SNAPSHOT_SCHEMA_VERSION,
                               course: CourseProgress { lesson_id: manifest.lesson_id(),
                                                        progress: progress_fraction(index, manifest.len(), finished),
                                                        is_complete: finished },
                               navigation: NavigationState { active_module_index: index,
                                                             active_module_id: runner.active_module().map(|m| m.id.clone()) },
                               inventory: InventoryState { collected_ids: artifacts.collected_ids() },
                               modules })
    }

    /// Persiste el snapshot actual y avisa al host. Nunca falla hacia
    /// fuera: devuelve `false` si no se pudo guardar.
    pub fn save<E: EventStore>(&mut self, runner: &LessonRunner<E>, artifacts: &ArtifactRegistry) -> bool {
        let Some(snapshot) = self.snapshot(runner, artifacts) else {
            debug!("save:skipped reason=no-lesson");
            return false;
        };
        let bytes = match snapshot.to_bytes() {
            Ok(b) => b,
            Err(e) => {
                warn!("save:encode-failed err={e}");
                return false;
            }
        };
        if let Err(e) = self.store.set(&self.key, &bytes) {
            warn!("save:store-failed key={} err={e}", self.key);
            return false;
        }
        debug!("save:done key={} bytes={} index={}", self.key, bytes.len(), snapshot.navigation.active_module_index);
        let msg = HostMessage::SnapshotSaved { lesson_id: snapshot.course.lesson_id,
                                               timestamp: snapshot.timestamp,
                                               progress: snapshot.course.progress,
                                               engine_version: ENGINE_VERSION.to_string() };
        if let Err(e) = self.host.post(&msg) {
            warn!("save:host-post-failed err={e}");
        }
        true
    }

    /// Aplica un snapshot: inventario, luego tokens de módulo y navegación.
    /// Toda la validación ocurre antes de mutar nada.
    ///
    /// Si el módulo guardado ya no existe en el manifest se conserva el
    /// inventario pero no se navega (`NavOutcome::Unchanged`).
    pub fn restore<E: EventStore>(&mut self,
                                  snapshot: &SessionSnapshot,
                                  runner: &mut LessonRunner<E>,
                                  artifacts: &mut ArtifactRegistry)
                                  -> Result<NavOutcome, SnapshotError> {
        snapshot.check_schema()?;
        let manifest = runner.manifest().ok_or(SnapshotError::NoLesson)?;
        let expected = manifest.lesson_id();
        if snapshot.course.lesson_id != expected {
            return Err(SnapshotError::LessonMismatch { found: snapshot.course.lesson_id.clone(),
                                                       expected });
        }
        let n = manifest.len() as i64;
        let saved_index = snapshot.navigation.active_module_index;
        if saved_index > n {
            return Err(SnapshotError::InvalidIndex { index: saved_index, max: n });
        }
        let target = match &snapshot.navigation.active_module_id {
            Some(id) => match manifest.module_index(id) {
                Some(i) => Some(i as i64),
                None => {
                    warn!("restore:module-gone module_id={id} saved_index={saved_index}");
                    None
                }
            },
            None if (0..n).contains(&saved_index) => {
                warn!("restore:module-id-missing saved_index={saved_index}");
                Some(saved_index)
            }
            None => Some(saved_index),
        };

        let accepted = artifacts.set_collected_ids(&snapshot.inventory.collected_ids);
        let outcome = match target {
            Some(index) => runner.apply_restore(snapshot.restore_plan(index)),
            None => NavOutcome::Unchanged,
        };
        info!("restore:done index={} artifacts={accepted} outcome={outcome:?}", runner.index());
        Ok(outcome)
    }

    /// Arranque: aplica como mucho una fuente de estado, por precedencia.
    pub fn boot<E: EventStore>(&mut self, runner: &mut LessonRunner<E>, artifacts: &mut ArtifactRegistry) -> RecoverySource {
        let source = self.boot_inner(runner, artifacts);
        let msg = HostMessage::SessionRestored { source,
                                                 active_module_index: runner.index() };
        if let Err(e) = self.host.post(&msg) {
            warn!("boot:host-post-failed err={e}");
        }
        info!("boot:done source={source:?} index={}", runner.index());
        source
    }

    fn boot_inner<E: EventStore>(&mut self, runner: &mut LessonRunner<E>, artifacts: &mut ArtifactRegistry) -> RecoverySource {
        if let Some(raw) = self.injected.take() {
            match self.restore_bytes(&raw, runner, artifacts) {
                Ok(_) => return RecoverySource::Injected,
                Err(e) => warn!("boot:injected-discarded err={e}"),
            }
        }
        match self.store.get(&self.key) {
            Ok(Some(raw)) => match self.restore_bytes(&raw, runner, artifacts) {
                Ok(_) => return RecoverySource::Persisted,
                Err(e) => warn!("boot:persisted-discarded key={} err={e}", self.key),
            },
            Ok(None) => debug!("boot:no-persisted key={}", self.key),
            Err(e) => warn!("boot:store-unavailable err={e}"),
        }
        RecoverySource::Cold
    }

    fn restore_bytes<E: EventStore>(&mut self,
                                    raw: &[u8],
                                    runner: &mut LessonRunner<E>,
                                    artifacts: &mut ArtifactRegistry)
                                    -> Result<NavOutcome, SnapshotError> {
        let snapshot = SessionSnapshot::from_slice(raw)?;
        self.restore(&snapshot, runner, artifacts)
    }

    /// Borra el snapshot persistido.
    pub fn clear_persisted(&mut self) -> bool {
        match self.store.remove(&self.key) {
            Ok(removed) => removed,
            Err(e) => {
                warn!("clear:failed key={} err={e}", self.key);
                false
            }
        }
    }
}

impl fmt::Debug for SessionStateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStateManager")
         .field("key", &self.key)
         .field("injected", &self.injected.as_ref().map(Vec::len))
         .finish()
    }
}
