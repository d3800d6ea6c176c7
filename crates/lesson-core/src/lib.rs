//! lesson-core: runner de lecciones interactivas.
//!
//! Piezas:
//! - `manifest`: lección declarativa (módulos, artifacts, tema).
//! - `method`: contrato común de los métodos de enseñanza.
//! - `registry`: tag de tipo -> factory de métodos.
//! - `runner`: FSM de navegación con cooldown y auto-avance.
//! - `artifact`: coleccionables e inventario.
//! - `session`: snapshot, persistencia y fachada `LessonSession`.
pub mod artifact;
pub mod clock;
pub mod constants;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod manifest;
pub mod method;
pub mod registry;
pub mod runner;
pub mod session;

pub use artifact::{ArtifactRegistry, CollectOutcome, InventoryUi, UnlockRule};
pub use clock::{deadline_after, Clock, ManualClock, SystemClock};
pub use errors::{CoreEngineError, MethodError};
pub use event::{EventStore, InMemoryEventStore, LessonEvent, LessonEventKind};
pub use manifest::{ArtifactSpec, Manifest, ModuleSpec, OnEnterAction, Theme, Trigger};
pub use method::{create_method, ContainerHandle, Lifecycle, MethodBehavior, MethodCore, MethodEventKind, MethodInstance,
                 MethodMessage, Topic};
pub use registry::{MethodFactory, MethodRegistry};
pub use runner::{DropReason, LessonRunner, NavOutcome, RestorePlan, RestoreToken, RunnerBuilder, RunnerConfig, RunnerPhase};
pub use session::{HostChannel, HostMessage, InMemorySnapshotStore, LessonSession, RecoverySource, SessionSnapshot,
                  SessionStateManager, SnapshotError, SnapshotStore, StoreError};
