//! Builder para `LessonRunner`.
//!
//! Agrupa las dependencias inyectables del runner: store de eventos,
//! registry de métodos, reloj, tiempos y contenedor de render. Todas tienen
//! un valor por defecto razonable salvo el registry, que normalmente lo
//! llena el crate de adapters.
//!
//! ```ignore
//! let runner = LessonRunner::builder()
//!     .registry(registry)
//!     .clock(ManualClock::default())
//!     .build();
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use uuid::Uuid;

use super::{LessonRunner, RunnerConfig, RunnerPhase};
use crate::clock::{Clock, SystemClock};
use crate::constants::DEFAULT_CONTAINER;
use crate::event::EventStore;
use crate::method::ContainerHandle;
use crate::registry::MethodRegistry;

pub struct RunnerBuilder<E: EventStore> {
    event_store: E,
    registry: MethodRegistry,
    clock: Rc<dyn Clock>,
    config: RunnerConfig,
    container: Option<ContainerHandle>,
    session_id: Option<Uuid>,
}

impl<E: EventStore> RunnerBuilder<E> {
    pub(crate) fn new(event_store: E) -> Self {
        Self { event_store,
               registry: MethodRegistry::new(),
               clock: Rc::new(SystemClock),
               config: RunnerConfig::default(),
               container: Some(ContainerHandle::new(DEFAULT_CONTAINER)),
               session_id: None }
    }

    pub fn registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Reloj ya compartido (p.ej. con el `SessionStateManager`).
    pub fn shared_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn container(mut self, container: ContainerHandle) -> Self {
        self.container = Some(container);
        self
    }

    /// Sin contenedor: toda transición abortará hasta `attach_container`.
    pub fn without_container(mut self) -> Self {
        self.container = None;
        self
    }

    pub fn session_id(mut self, id: Uuid) -> Self {
        self.session_id = Some(id);
        self
    }

    pub fn build(self) -> LessonRunner<E> {
        LessonRunner { session_id: self.session_id.unwrap_or_else(Uuid::new_v4),
                       event_store: self.event_store,
                       registry: self.registry,
                       clock: self.clock,
                       config: self.config,
                       container: self.container,
                       manifest: None,
                       index: -1,
                       phase: RunnerPhase::Idle,
                       active: None,
                       pending_advance: None,
                       restore_tokens: HashMap::new(),
                       collection_requests: Vec::new(),
                       finished_emitted: false }
    }
}
