//! Estado de sesión: snapshot, persistencia y fachada `LessonSession`.

mod lesson_session;
mod manager;
mod snapshot;
mod store;

pub use lesson_session::LessonSession;
pub use manager::SessionStateManager;
pub use snapshot::{progress_fraction, CourseProgress, InventoryState, NavigationState, SessionSnapshot, SnapshotError};
pub use store::{HostChannel, HostMessage, InMemorySnapshotStore, NullHostChannel, RecordingHostChannel, RecoverySource,
                SnapshotStore, StoreError};
