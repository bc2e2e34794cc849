//! Error types for varstore.
//!
//! All errors are strongly typed using thiserror. The four caller-visible
//! kinds of the store contract map onto this hierarchy:
//!
//! - reference-not-found → [`ReferenceError`]
//! - invalid definition → [`ValidationError`]
//! - unregistered instance → [`VarError::UnregisteredInstance`]
//! - value not found → [`VarError::ValueNotFound`] (a normal query outcome,
//!   not a fault; see [`VarError::is_not_found`])

use thiserror::Error;

use crate::entity::EntityId;
use crate::instance::{InstanceId, InstanceKey};
use crate::project::ProjectId;
use crate::storage::StorageError;
use crate::variable::VariableId;

/// Validation errors raised while checking definitions before any write.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Project name cannot be empty")]
    EmptyProjectName,

    #[error("Entity name cannot be empty")]
    EmptyEntityName,

    #[error("Variable name cannot be empty")]
    EmptyVariableName,

    #[error("Instance id cannot be blank")]
    BlankInstanceId,

    #[error("Variable '{variable}' is not an input and must reference a computation function")]
    MissingFunctionName {
        variable: String,
    },
}

/// A parent id named by a request does not exist in the catalog.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Project not found: {id}")]
    ProjectNotFound {
        id: ProjectId,
    },

    #[error("Entity not found: {id}")]
    EntityNotFound {
        id: EntityId,
    },

    #[error("Variable not found: {id}")]
    VariableNotFound {
        id: VariableId,
    },
}

/// Top-level error type for varstore operations.
#[derive(Debug, Error)]
pub enum VarError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Reference error: {0}")]
    Reference(#[from] ReferenceError),

    /// A value write targeted an instance absent from the registry. The
    /// write was rejected before any state changed.
    #[error("Instance not registered: {instance}")]
    UnregisteredInstance {
        instance: InstanceKey,
    },

    /// No stored value matched a resolution request. This is an expected
    /// outcome, distinguished from fault-like errors via `is_not_found`.
    #[error("No value found for variable {variable_id} on instance '{instance_id}'")]
    ValueNotFound {
        variable_id: VariableId,
        instance_id: InstanceId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl VarError {
    /// Returns true if this is a definition validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if a named parent id did not exist.
    #[must_use]
    pub const fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// Returns true if a write was rejected by the integrity guard.
    #[must_use]
    pub const fn is_unregistered_instance(&self) -> bool {
        matches!(self, Self::UnregisteredInstance { .. })
    }

    /// Returns true for the normal no-matching-value query outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ValueNotFound { .. })
    }

    /// Returns true if the storage backend itself failed.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type alias for varstore operations.
pub type VarResult<T> = Result<T, VarError>;
