//! lesson-persistence
//!
//! Implementaciones en disco de los puertos del core:
//! - `fs::FileSnapshotStore`: `SnapshotStore` con un archivo JSON por clave
//!   (escritura atómica vía archivo temporal + rename).
//! - `journal::FileEventStore`: `EventStore` append-only en JSON lines, un
//!   archivo por sesión.
//! - `host::JsonLinesHostChannel`: `HostChannel` sobre cualquier `Write`.
//! - `config`: carga de configuración desde .env.

pub mod config;
pub mod error;
pub mod fs;
pub mod host;
pub mod journal;

pub use config::{init_dotenv, StoreConfig};
pub use error::PersistenceError;
pub use fs::FileSnapshotStore;
pub use host::JsonLinesHostChannel;
pub use journal::FileEventStore;
