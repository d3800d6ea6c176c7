//! Fachada que une runner, registry de artifacts y gestor de estado.
//!
//! El runner sólo encola solicitudes de colección; la sesión las entrega al
//! `ArtifactRegistry` después de cada operación y, con autosave activo,
//! guarda un snapshot tras cada entrada a módulo o fin de lección.

use serde_json::Value;

use super::manager::SessionStateManager;
use super::snapshot::{SessionSnapshot, SnapshotError};
use super::store::RecoverySource;
use crate::artifact::{ArtifactRegistry, CollectOutcome};
use crate::errors::{CoreEngineError, MethodError};
use crate::event::{EventStore, InMemoryEventStore};
use crate::manifest::Manifest;
use crate::method::MethodInstance;
use crate::runner::{LessonRunner, NavOutcome};

#[derive(Debug)]
pub struct LessonSession<E: EventStore = InMemoryEventStore> {
    runner: LessonRunner<E>,
    artifacts: ArtifactRegistry,
    state: SessionStateManager,
    autosave: bool,
}

impl<E: EventStore> LessonSession<E> {
    pub fn new(runner: LessonRunner<E>, artifacts: ArtifactRegistry, state: SessionStateManager) -> Self {
        Self { runner,
               artifacts,
               state,
               autosave: true }
    }

    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    pub fn runner(&self) -> &LessonRunner<E> {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut LessonRunner<E> {
        &mut self.runner
    }

    pub fn artifacts(&self) -> &ArtifactRegistry {
        &self.artifacts
    }

    pub fn artifacts_mut(&mut self) -> &mut ArtifactRegistry {
        &mut self.artifacts
    }

    pub fn state(&self) -> &SessionStateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionStateManager {
        &mut self.state
    }

    /// Carga la lección y registra todas sus specs de artifacts (globales y
    /// por módulo).
    pub fn load_lesson(&mut self, manifest: Manifest) -> Result<(), CoreEngineError> {
        self.runner.load_lesson(manifest)?;
        if let Some(m) = self.runner.manifest() {
            self.artifacts.register_specs(m.all_artifacts());
        }
        Ok(())
    }

    pub fn begin(&mut self) -> NavOutcome {
        let outcome = self.runner.begin();
        self.after_navigation(&outcome);
        outcome
    }

    pub fn next_module(&mut self) -> NavOutcome {
        let outcome = self.runner.next_module();
        self.after_navigation(&outcome);
        outcome
    }

    pub fn prev_module(&mut self) -> NavOutcome {
        let outcome = self.runner.prev_module();
        self.after_navigation(&outcome);
        outcome
    }

    pub fn jump_to(&mut self, index: usize) -> NavOutcome {
        let outcome = self.runner.jump_to(index);
        self.after_navigation(&outcome);
        outcome
    }

    pub fn tick(&mut self) -> Option<NavOutcome> {
        let outcome = self.runner.tick();
        match &outcome {
            Some(o) => self.after_navigation(o),
            None => self.flush_collections(),
        }
        outcome
    }

    pub fn dispatch_input(&mut self, input: &Value) -> Result<(), MethodError> {
        let result = self.runner.dispatch_input(input);
        self.flush_collections();
        result
    }

    pub fn with_active<R, F>(&mut self, f: F) -> Option<R>
        where F: FnOnce(&mut MethodInstance) -> R
    {
        let result = self.runner.with_active(f);
        self.flush_collections();
        result
    }

    /// Colección manual (artifacts con trigger `manual`).
    pub fn collect(&mut self, artifact_id: &str) -> CollectOutcome {
        self.artifacts.collect(artifact_id)
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state.snapshot(&self.runner, &self.artifacts)
    }

    pub fn save(&mut self) -> bool {
        self.state.save(&self.runner, &self.artifacts)
    }

    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<NavOutcome, SnapshotError> {
        let outcome = self.state.restore(snapshot, &mut self.runner, &mut self.artifacts);
        self.flush_collections();
        outcome
    }

    pub fn inject_snapshot(&mut self, raw: impl Into<Vec<u8>>) {
        self.state.inject(raw);
    }

    pub fn boot(&mut self) -> RecoverySource {
        let source = self.state.boot(&mut self.runner, &mut self.artifacts);
        self.flush_collections();
        source
    }

    fn after_navigation(&mut self, outcome: &NavOutcome) {
        self.flush_collections();
        if self.autosave && outcome.moved() {
            self.save();
        }
    }

    fn flush_collections(&mut self) {
        for id in self.runner.take_collection_requests() {
            self.artifacts.collect(&id);
        }
    }
}
