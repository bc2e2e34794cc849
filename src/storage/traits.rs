//! Abstract storage traits for varstore.
//!
//! These traits define the contract that storage backends must implement.
//! By using traits, we enable:
//! - In-memory backends for testing and embedded use
//! - Persistent backends for production
//!
//! The durable store itself is an external collaborator: the crate ships only
//! the in-memory reference backend, and everything above this boundary is
//! backend-agnostic.

use thiserror::Error;

use crate::context::Context;
use crate::entity::{Entity, EntityId};
use crate::instance::{EntityInstance, InstanceKey};
use crate::project::{Project, ProjectId};
use crate::value::{Value, VariableValue};
use crate::variable::{Variable, VariableId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Project not found.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// Entity not found.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Variable not found.
    #[error("Variable not found: {0}")]
    VariableNotFound(VariableId),

    /// A value commit referenced an instance absent from the registry.
    ///
    /// This is the storage-level form of the integrity constraint: backends
    /// must reject the commit rather than persist an orphan row.
    #[error("Instance not registered: {instance}")]
    UnregisteredInstance {
        /// The missing (entity, instance id) pair.
        instance: InstanceKey,
    },

    /// Key already exists.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Backend error.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage trait for Project records.
pub trait ProjectStore: Send + Sync {
    /// Insert a new project. Returns error if the ID already exists.
    fn insert(&self, project: Project) -> Result<(), StorageError>;

    /// Get a project by ID.
    fn get(&self, id: ProjectId) -> Result<Option<Project>, StorageError>;

    /// Update an existing project. Returns error if not found.
    fn update(&self, project: Project) -> Result<(), StorageError>;

    /// List all projects.
    fn list(&self) -> Result<Vec<Project>, StorageError>;
}

/// Storage trait for Entity records.
pub trait EntityStore: Send + Sync {
    /// Insert a new entity. Returns error if the ID already exists.
    fn insert(&self, entity: Entity) -> Result<(), StorageError>;

    /// Get an entity by ID.
    fn get(&self, id: EntityId) -> Result<Option<Entity>, StorageError>;

    /// Update an existing entity. Returns error if not found.
    fn update(&self, entity: Entity) -> Result<(), StorageError>;

    /// List entities belonging to a project.
    fn find_by_project(&self, project_id: ProjectId) -> Result<Vec<Entity>, StorageError>;
}

/// Storage trait for Variable definitions.
pub trait VariableStore: Send + Sync {
    /// Insert a new variable. Returns error if the ID already exists.
    fn insert(&self, variable: Variable) -> Result<(), StorageError>;

    /// Get a variable by ID.
    fn get(&self, id: VariableId) -> Result<Option<Variable>, StorageError>;

    /// List variables defined on an entity.
    fn find_by_entity(&self, entity_id: EntityId) -> Result<Vec<Variable>, StorageError>;
}

/// Storage trait for the instance registry.
///
/// # Consistency
/// `exists` must be strongly consistent with `upsert`: a value write
/// immediately after a registration must observe the instance.
pub trait InstanceStore: Send + Sync {
    /// Register or re-register an instance. Re-registration replaces the
    /// stored metadata wholesale. Returns the stored record.
    fn upsert(&self, instance: EntityInstance) -> Result<EntityInstance, StorageError>;

    /// Get an instance by key.
    fn get(&self, key: &InstanceKey) -> Result<Option<EntityInstance>, StorageError>;

    /// Fast existence check; the integrity guard depends on it.
    fn exists(&self, key: &InstanceKey) -> Result<bool, StorageError>;

    /// Remove a registration. Returns true if it existed. Stored value rows
    /// referencing the instance are left in place (retain-orphans policy).
    fn remove(&self, key: &InstanceKey) -> Result<bool, StorageError>;

    /// List all instances registered under an entity.
    fn find_by_entity(&self, entity_id: EntityId) -> Result<Vec<EntityInstance>, StorageError>;
}

/// Storage trait for context-qualified variable values.
///
/// # Integrity
/// `upsert` must perform the instance-existence check and the row commit as
/// one atomic unit with respect to [`InstanceStore`] mutations, so a
/// concurrent deregistration can never interleave between check and write.
/// A failed check surfaces as [`StorageError::UnregisteredInstance`] and
/// leaves no partial state.
pub trait ValueStore: Send + Sync {
    /// Create-or-replace the row for the exact (variable, instance, context)
    /// key. Returns the stored row.
    fn upsert(
        &self,
        variable_id: VariableId,
        instance: InstanceKey,
        context: Context,
        value: Value,
    ) -> Result<VariableValue, StorageError>;

    /// All rows stored for a (variable, instance) pair, any context.
    fn find_by_pair(
        &self,
        variable_id: VariableId,
        instance: &InstanceKey,
    ) -> Result<Vec<VariableValue>, StorageError>;

    /// Number of rows stored for a (variable, instance) pair.
    fn count_by_pair(
        &self,
        variable_id: VariableId,
        instance: &InstanceKey,
    ) -> Result<usize, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure traits are object-safe
    fn _assert_project_store_object_safe(_: &dyn ProjectStore) {}
    fn _assert_entity_store_object_safe(_: &dyn EntityStore) {}
    fn _assert_variable_store_object_safe(_: &dyn VariableStore) {}
    fn _assert_instance_store_object_safe(_: &dyn InstanceStore) {}
    fn _assert_value_store_object_safe(_: &dyn ValueStore) {}

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::EntityNotFound(EntityId::new());
        assert!(err.to_string().contains("Entity not found"));

        let err = StorageError::UnregisteredInstance {
            instance: InstanceKey::new(EntityId::new(), "c-1"),
        };
        assert!(err.to_string().contains("not registered"));

        let err = StorageError::Backend("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
