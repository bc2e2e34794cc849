//! Storage backends for varstore.

pub mod memory;
pub mod traits;

pub use memory::{InMemoryCatalogStore, InMemoryRegistry};
pub use traits::{
    EntityStore, InstanceStore, ProjectStore, StorageError, ValueStore, VariableStore,
};
