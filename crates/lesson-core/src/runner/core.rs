//! Máquina de estados del reproductor de lecciones.
//!
//! El runner posee el índice del módulo actual y el único instance de método
//! vivo. No tiene hilos: cooldown y auto-avance son deadlines que se evalúan
//! contra el `Clock` inyectado cada vez que el host llama a una operación o a
//! `tick`.
//!
//! Garantías:
//! - Como mucho un instance vivo; el anterior se destruye antes de `init` del
//!   siguiente.
//! - Resolución del tipo y verificación del contenedor ocurren antes de
//!   destruir el módulo saliente; si fallan el índice no cambia.
//! - Las peticiones de navegación durante el cooldown se descartan.
//! - `LessonFinished` se registra una única vez por lección.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde_json::Value;
use uuid::Uuid;

use super::{DropReason, NavOutcome, RestorePlan, RestoreToken, RunnerBuilder, RunnerConfig, RunnerPhase};
use crate::clock::{deadline_after, Clock};
use crate::errors::{CoreEngineError, MethodError};
use crate::event::{EventStore, InMemoryEventStore, LessonEvent, LessonEventKind};
use crate::manifest::{Manifest, ModuleSpec, OnEnterAction, Trigger};
use crate::method::{ContainerHandle, MethodEventKind, MethodInstance};
use crate::registry::MethodRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingAdvance {
    index: usize,
    due: DateTime<Utc>,
}

pub struct LessonRunner<E: EventStore> {
    pub(crate) session_id: Uuid,
    pub(crate) event_store: E,
    pub(crate) registry: MethodRegistry,
    pub(crate) clock: Rc<dyn Clock>,
    pub(crate) config: RunnerConfig,
    pub(crate) container: Option<ContainerHandle>,
    pub(crate) manifest: Option<Manifest>,
    pub(crate) index: i64,
    pub(crate) phase: RunnerPhase,
    pub(crate) active: Option<MethodInstance>,
    pub(crate) pending_advance: Option<PendingAdvance>,
    pub(crate) restore_tokens: HashMap<String, RestoreToken>,
    pub(crate) collection_requests: Vec<String>,
    pub(crate) finished_emitted: bool,
}

impl LessonRunner<InMemoryEventStore> {
    /// Builder con journal en memoria.
    #[inline]
    pub fn builder() -> RunnerBuilder<InMemoryEventStore> {
        RunnerBuilder::new(InMemoryEventStore::default())
    }
}

impl<E: EventStore> LessonRunner<E> {
    #[inline]
    pub fn builder_with_store(event_store: E) -> RunnerBuilder<E> {
        RunnerBuilder::new(event_store)
    }

    /// Carga (o recarga) una lección. Valida el manifest, destruye el módulo
    /// vivo si lo hubiera y deja el runner en `AwaitingStart` con índice -1.
    pub fn load_lesson(&mut self, manifest: Manifest) -> Result<(), CoreEngineError> {
        if let Err(e) = manifest.validate() {
            error!("load_lesson:invalid err={e}");
            return Err(e);
        }
        self.teardown_active();
        let lesson_id = manifest.lesson_id();
        let module_count = manifest.len();
        let theme = manifest.theme.clone();
        self.manifest = Some(manifest);
        self.index = -1;
        self.phase = RunnerPhase::AwaitingStart;
        self.pending_advance = None;
        self.restore_tokens.clear();
        self.collection_requests.clear();
        self.finished_emitted = false;
        self.journal(LessonEventKind::LessonLoaded { lesson_id: lesson_id.clone(), module_count });
        self.journal(LessonEventKind::ThemeApplied { theme });
        self.journal(LessonEventKind::AwaitingStart);
        info!("load_lesson:done lesson_id={lesson_id} modules={module_count}");
        Ok(())
    }

    /// Gesto de apertura. Entra al módulo 0 (o termina si la lección está
    /// vacía). Si ya hay un módulo en curso, p.ej. tras un restore, no hace
    /// nada.
    pub fn begin(&mut self) -> NavOutcome {
        self.settle();
        match self.phase {
            RunnerPhase::Idle => self.drop_request(0, DropReason::NotLoaded),
            RunnerPhase::AwaitingStart => {
                self.journal(LessonEventKind::Ready);
                self.perform_transition(0)
            }
            _ => self.drop_request(0, DropReason::AlreadyStarted),
        }
    }

    pub fn next_module(&mut self) -> NavOutcome {
        let target = self.index + 1;
        self.request(target)
    }

    pub fn prev_module(&mut self) -> NavOutcome {
        let target = self.index - 1;
        self.request(target)
    }

    /// Salto directo. `index == module_count()` termina la lección.
    pub fn jump_to(&mut self, index: usize) -> NavOutcome {
        self.request(index as i64)
    }

    /// Evalúa deadlines vencidos. Devuelve el resultado del auto-avance si se
    /// disparó en esta llamada.
    pub fn tick(&mut self) -> Option<NavOutcome> {
        self.settle();
        let pending = self.pending_advance?;
        if self.index != pending.index as i64 {
            debug!("tick:advance-cancelled scheduled={} index={}", pending.index, self.index);
            self.pending_advance = None;
            return None;
        }
        if self.clock.now() < pending.due {
            return None;
        }
        if matches!(self.phase, RunnerPhase::Transitioning { .. }) {
            // se reintenta en el siguiente tick
            return None;
        }
        self.pending_advance = None;
        debug!("tick:auto-advance from={}", pending.index);
        Some(self.perform_transition(pending.index + 1))
    }

    /// Drena el outbox del instance activo y reacciona a `Complete` y a las
    /// solicitudes de artifacts. Sólo cuenta el `Complete` del propio
    /// instance raíz; los que suben desde hijos se ignoran.
    pub fn pump(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let messages = active.take_outbox();
        let mut completed = false;
        for msg in messages {
            match msg.kind {
                MethodEventKind::Complete if msg.is_own() => completed = true,
                MethodEventKind::CollectArtifact => match msg.payload.get("id").and_then(Value::as_str) {
                    Some(id) => self.request_artifact(id),
                    None => warn!("pump:collect-without-id source={}", msg.label()),
                },
                _ => {}
            }
        }
        if completed {
            self.on_module_completed();
        }
    }

    /// Reenvía un input al instance activo.
    pub fn dispatch_input(&mut self, input: &Value) -> Result<(), MethodError> {
        let result = match self.active.as_mut() {
            Some(active) => active.handle_input(input),
            None => Err(MethodError::NoActiveMethod),
        };
        self.pump();
        result
    }

    /// Acceso mutable al instance activo; el outbox se drena al terminar.
    pub fn with_active<R, F>(&mut self, f: F) -> Option<R>
        where F: FnOnce(&mut MethodInstance) -> R
    {
        let result = f(self.active.as_mut()?);
        self.pump();
        Some(result)
    }

    /// Aplica un plan de restore. Ignora el gesto de apertura y el cooldown
    /// vigente. Los tokens se entregan al instance tras su `init`.
    pub fn apply_restore(&mut self, plan: RestorePlan) -> NavOutcome {
        if self.manifest.is_none() {
            warn!("apply_restore:ignored reason=not-loaded");
            return NavOutcome::Aborted(CoreEngineError::LessonNotLoaded);
        }
        self.restore_tokens = plan.tokens.into_iter().map(|t| (t.module_id.clone(), t)).collect();
        self.pending_advance = None;
        self.journal(LessonEventKind::RestoreApplied { index: plan.index });
        let n = self.module_count() as i64;
        info!("apply_restore:start index={} tokens={}", plan.index, self.restore_tokens.len());
        if plan.index < 0 {
            NavOutcome::Unchanged
        } else if plan.index >= n {
            self.finish()
        } else {
            self.perform_transition(plan.index as usize)
        }
    }

    /// Ids de artifacts que el host debe entregar al `ArtifactRegistry`.
    pub fn take_collection_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.collection_requests)
    }

    pub fn attach_container(&mut self, container: ContainerHandle) {
        self.container = Some(container);
    }

    pub fn detach_container(&mut self) -> Option<ContainerHandle> {
        self.container.take()
    }

    // ---- lectura ----

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Índice actual: -1 antes de empezar, N al terminar.
    pub fn index(&self) -> i64 {
        self.index
    }

    /// Fase efectiva según el reloj actual.
    pub fn phase(&self) -> RunnerPhase {
        match self.phase {
            RunnerPhase::Transitioning { index, until } if self.clock.now() >= until => RunnerPhase::Active { index },
            other => other,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn module_count(&self) -> usize {
        self.manifest.as_ref().map(Manifest::len).unwrap_or(0)
    }

    pub fn active(&self) -> Option<&MethodInstance> {
        self.active.as_ref()
    }

    /// Spec del módulo en el índice actual (exista o no su instance).
    pub fn active_module(&self) -> Option<&ModuleSpec> {
        let index = usize::try_from(self.index).ok()?;
        self.manifest.as_ref()?.module(index)
    }

    /// Vencimiento del auto-avance programado, si lo hay.
    pub fn pending_advance(&self) -> Option<DateTime<Utc>> {
        self.pending_advance.map(|p| p.due)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MethodRegistry {
        &mut self.registry
    }

    pub fn event_store(&self) -> &E {
        &self.event_store
    }

    pub fn events(&self) -> Vec<LessonEvent> {
        self.event_store.list(self.session_id)
    }

    /// Secuencia compacta de códigos de evento (ver `LessonEventKind::code`).
    pub fn event_variants(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.kind.code()).collect()
    }

    /// Rutas de todos los instances vivos (vacío si no hay módulo activo).
    pub fn instance_names(&self) -> Vec<String> {
        self.active.as_ref().map(MethodInstance::instance_names).unwrap_or_default()
    }

    // ---- internos ----

    fn journal(&mut self, kind: LessonEventKind) {
        let ts = self.clock.now();
        self.event_store.append_kind(self.session_id, kind, ts);
    }

    fn settle(&mut self) {
        if let RunnerPhase::Transitioning { index, until } = self.phase {
            if self.clock.now() >= until {
                self.phase = RunnerPhase::Active { index };
            }
        }
    }

    fn request(&mut self, target: i64) -> NavOutcome {
        self.settle();
        let blocked = match self.phase {
            RunnerPhase::Idle => Some(DropReason::NotLoaded),
            RunnerPhase::AwaitingStart => Some(DropReason::AwaitingStart),
            RunnerPhase::Finished => Some(DropReason::Finished),
            RunnerPhase::Transitioning { .. } => Some(DropReason::InFlight),
            RunnerPhase::Active { .. } => None,
        };
        if let Some(reason) = blocked {
            return self.drop_request(target, reason);
        }
        if target < 0 || target > self.module_count() as i64 {
            return self.drop_request(target, DropReason::OutOfRange(target));
        }
        self.perform_transition(target as usize)
    }

    fn drop_request(&mut self, requested: i64, reason: DropReason) -> NavOutcome {
        debug!("transition:dropped requested={requested} reason={reason}");
        self.journal(LessonEventKind::TransitionDropped { requested, reason: reason.to_string() });
        NavOutcome::Dropped(reason)
    }

    fn abort(&mut self, requested: usize, error: CoreEngineError) -> NavOutcome {
        error!("transition:aborted requested={requested} err={error}");
        self.journal(LessonEventKind::TransitionAborted { requested: requested as i64, error: error.clone() });
        NavOutcome::Aborted(error)
    }

    fn perform_transition(&mut self, target: usize) -> NavOutcome {
        let from = self.index;
        if target >= self.module_count() {
            return self.finish();
        }
        let Some(spec) = self.manifest.as_ref().and_then(|m| m.module(target)).cloned() else {
            return self.abort(target, CoreEngineError::LessonNotLoaded);
        };
        let Some(container) = self.container.clone() else {
            return self.abort(target, CoreEngineError::MissingRenderTarget);
        };
        let Some(mut instance) = self.registry.create(&spec.method_type) else {
            return self.abort(target, CoreEngineError::UnresolvedMethodType(spec.method_type.clone()));
        };

        self.teardown_active();
        self.pending_advance = None;
        if let Err(e) = instance.init(container, &spec.config) {
            instance.destroy();
            return self.abort(target, CoreEngineError::MethodInitFailed(e.to_string()));
        }
        if let Some(token) = self.restore_tokens.remove(&spec.id) {
            debug!("transition:restore-token module_id={}", spec.id);
            instance.set_state(&token.state);
        }
        self.active = Some(instance);
        self.index = target as i64;
        let until = deadline_after(self.clock.now(), self.config.transition_cooldown);
        self.phase = RunnerPhase::Transitioning { index: target, until };
        self.journal(LessonEventKind::ModuleEntered { index: target, module_id: spec.id.clone() });
        info!("transition:entered from={from} to={target} module_id={} type={}", spec.id, spec.method_type);
        self.on_module_entered(&spec);
        self.pump();
        NavOutcome::Entered { from, to: target }
    }

    fn teardown_active(&mut self) {
        let Some(mut instance) = self.active.take() else {
            return;
        };
        instance.destroy();
        if let Some(module_id) = self.active_module().map(|m| m.id.clone()) {
            let index = self.index as usize;
            self.journal(LessonEventKind::ModuleExited { index, module_id });
        }
    }

    fn finish(&mut self) -> NavOutcome {
        self.teardown_active();
        self.index = self.module_count() as i64;
        self.phase = RunnerPhase::Finished;
        self.pending_advance = None;
        if !self.finished_emitted {
            self.finished_emitted = true;
            self.journal(LessonEventKind::LessonFinished);
            info!("lesson:finished modules={}", self.index);
        }
        NavOutcome::Finished
    }

    fn on_module_entered(&mut self, spec: &ModuleSpec) {
        match &spec.on_enter {
            Some(OnEnterAction::CollectArtifact { id }) => self.request_artifact(id),
            Some(OnEnterAction::Signal { name, payload }) => {
                self.journal(LessonEventKind::Signal { module_id: spec.id.clone(),
                                                       name: name.clone(),
                                                       payload: payload.clone() })
            }
            None => {}
        }
        for artifact in spec.artifacts_with(Trigger::OnModuleEnter) {
            self.request_artifact(&artifact.id);
        }
    }

    fn on_module_completed(&mut self) {
        let Some(spec) = self.active_module().cloned() else {
            return;
        };
        let index = self.index as usize;
        self.journal(LessonEventKind::ModuleCompleted { index, module_id: spec.id.clone() });
        for artifact in spec.artifacts_with(Trigger::OnStepComplete) {
            self.request_artifact(&artifact.id);
        }
        if self.pending_advance.is_some() {
            return;
        }
        let due = deadline_after(self.clock.now(), self.config.settle_delay);
        self.pending_advance = Some(PendingAdvance { index, due });
        self.journal(LessonEventKind::AdvanceScheduled { index, due });
        debug!("advance:scheduled index={index} due={due}");
    }

    fn request_artifact(&mut self, artifact_id: &str) {
        self.collection_requests.push(artifact_id.to_string());
        self.journal(LessonEventKind::ArtifactRequested { artifact_id: artifact_id.to_string() });
    }
}

impl<E: EventStore + fmt::Debug> fmt::Debug for LessonRunner<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LessonRunner")
         .field("session_id", &self.session_id)
         .field("index", &self.index)
         .field("phase", &self.phase)
         .field("container", &self.container)
         .field("active", &self.active.as_ref().map(|a| a.name().to_string()))
         .field("pending_advance", &self.pending_advance)
         .finish()
    }
}
