//! Variable definitions.
//!
//! A variable is a named attribute defined on an entity. It is either an
//! externally supplied input (`is_input = true`) or produced by a named
//! computation function that lives outside this store. The store never
//! executes `function_name`; it is an opaque reference.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::EntityId;
use crate::error::ValidationError;

/// Globally unique, stable variable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(Uuid);

impl VariableId {
    /// Creates a new random variable ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a variable ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns true if this is a nil (all zeros) UUID.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Creates a nil variable ID (for testing or sentinel values).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for VariableId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VariableId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<VariableId> for Uuid {
    fn from(id: VariableId) -> Self {
        id.0
    }
}

/// A named attribute defined on an entity.
///
/// Construct via [`Variable::builder`], which enforces the definition
/// invariant: a non-input variable must reference a computation function.
///
/// # Examples
///
/// ```
/// use varstore::{EntityId, Variable};
///
/// let entity_id = EntityId::new();
///
/// // An externally supplied input.
/// let age = Variable::builder(entity_id, "age").input().build().unwrap();
/// assert!(age.is_input);
///
/// // A computed variable must name its function.
/// let score = Variable::builder(entity_id, "risk_score")
///     .function("compute_risk_score")
///     .build()
///     .unwrap();
/// assert_eq!(score.function_name.as_deref(), Some("compute_risk_score"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    /// Globally unique identifier
    pub id: VariableId,

    /// Owning entity; immutable after creation
    pub entity_id: EntityId,

    pub name: String,

    /// True when the value is supplied from outside rather than computed.
    pub is_input: bool,

    /// Opaque reference to the external computation that produces this
    /// variable. Required when `is_input` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    /// Whether computed values should be written back to the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_persisted: Option<bool>,

    /// Names of variables the computation reads, used for dependency
    /// planning. Meaningless (and normally empty) for inputs.
    #[serde(default)]
    pub input_variables: Vec<String>,

    #[serde(default)]
    pub metadata: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Variable {
    /// Starts building a variable on the given entity.
    #[must_use]
    pub fn builder(entity_id: EntityId, name: impl Into<String>) -> VariableBuilder {
        VariableBuilder::new(entity_id, name)
    }

    /// Returns true if this variable is computed by an external function.
    #[must_use]
    pub const fn is_computed(&self) -> bool {
        !self.is_input
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

/// Builder for [`Variable`] definitions.
///
/// Defaults to a computed variable with no function, so `build` fails unless
/// the caller either marks the variable as an input or names a function.
#[derive(Debug, Clone)]
pub struct VariableBuilder {
    entity_id: EntityId,
    name: String,
    is_input: bool,
    function_name: Option<String>,
    is_persisted: Option<bool>,
    input_variables: Vec<String>,
    metadata: serde_json::Value,
}

impl VariableBuilder {
    fn new(entity_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            entity_id,
            name: name.into(),
            is_input: false,
            function_name: None,
            is_persisted: None,
            input_variables: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Marks this variable as an externally supplied input.
    #[must_use]
    pub const fn input(mut self) -> Self {
        self.is_input = true;
        self
    }

    /// Names the external computation function for a non-input variable.
    #[must_use]
    pub fn function(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    /// Sets whether computed values are written back to the store.
    #[must_use]
    pub const fn persisted(mut self, is_persisted: bool) -> Self {
        self.is_persisted = Some(is_persisted);
        self
    }

    /// Declares a variable name the computation depends on.
    #[must_use]
    pub fn depends_on(mut self, variable_name: impl Into<String>) -> Self {
        self.input_variables.push(variable_name.into());
        self
    }

    /// Attaches free-form metadata.
    #[must_use]
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Validates the definition and produces the variable.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyVariableName`] if the name is blank.
    /// - [`ValidationError::MissingFunctionName`] if the variable is not an
    ///   input and `function_name` is absent or blank.
    pub fn build(self) -> Result<Variable, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyVariableName);
        }

        let function_name = self
            .function_name
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(String::from);

        if !self.is_input && function_name.is_none() {
            return Err(ValidationError::MissingFunctionName {
                variable: self.name,
            });
        }

        let now = Utc::now();
        Ok(Variable {
            id: VariableId::new(),
            entity_id: self.entity_id,
            name: self.name,
            is_input: self.is_input,
            function_name,
            is_persisted: self.is_persisted,
            input_variables: self.input_variables,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_id_creation() {
        let id1 = VariableId::new();
        let id2 = VariableId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_input_variable_needs_no_function() {
        let var = Variable::builder(EntityId::new(), "age")
            .input()
            .build()
            .unwrap();
        assert!(var.is_input);
        assert!(!var.is_computed());
        assert!(var.function_name.is_none());
    }

    #[test]
    fn test_computed_variable_requires_function() {
        let err = Variable::builder(EntityId::new(), "score")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingFunctionName { variable } if variable == "score"
        ));
    }

    #[test]
    fn test_blank_function_name_rejected() {
        let err = Variable::builder(EntityId::new(), "score")
            .function("   ")
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::MissingFunctionName { .. }));
    }

    #[test]
    fn test_computed_variable_with_function() {
        let var = Variable::builder(EntityId::new(), "score")
            .function("compute_score")
            .persisted(true)
            .depends_on("age")
            .depends_on("income")
            .build()
            .unwrap();
        assert!(var.is_computed());
        assert_eq!(var.function_name.as_deref(), Some("compute_score"));
        assert_eq!(var.is_persisted, Some(true));
        assert_eq!(var.input_variables, vec!["age", "income"]);
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = Variable::builder(EntityId::new(), "  ")
            .input()
            .build()
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyVariableName));
    }

    #[test]
    fn test_variable_serialization() {
        let var = Variable::builder(EntityId::new(), "score")
            .function("f")
            .metadata(serde_json::json!({"unit": "points"}))
            .build()
            .unwrap();
        let json = serde_json::to_string(&var).unwrap();
        let back: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(var.id, back.id);
        assert_eq!(back.metadata["unit"], "points");
    }
}
