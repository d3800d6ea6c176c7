//! Coleccionables: validación contra specs declaradas e inventario.

mod inventory;
mod registry;

pub use inventory::{InventoryCall, InventoryUi, NullInventory, RecordingInventory, UnlockRule};
pub use registry::{ArtifactRegistry, CollectOutcome};
