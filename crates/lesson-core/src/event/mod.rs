//! Journal de eventos del runner y trait EventStore.

mod store;
mod types;

pub use store::{EventStore, InMemoryEventStore};
pub use types::{LessonEvent, LessonEventKind};
