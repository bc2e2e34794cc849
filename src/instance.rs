//! Entity instance registration.
//!
//! An instance is one concrete occurrence of an entity, identified by a
//! caller-supplied string that is unique within its entity (not globally).
//! The instance registry is the source of truth the integrity guard consults:
//! no variable value may be recorded against an unregistered instance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Open-ended JSON metadata attached to an instance.
pub type InstanceMetadata = serde_json::Map<String, serde_json::Value>;

/// Caller-supplied instance identifier, unique within its entity.
///
/// # Examples
///
/// ```
/// use varstore::InstanceId;
///
/// let id = InstanceId::from("customer-42");
/// assert_eq!(id.as_str(), "customer-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Creates an instance ID from a caller-supplied string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The composite key identifying an instance: (entity, instance id).
///
/// Instance IDs are only unique within their entity, so every lookup that
/// touches the registry carries both halves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub entity_id: EntityId,
    pub instance_id: InstanceId,
}

impl InstanceKey {
    /// Creates a key from its two halves.
    #[must_use]
    pub fn new(entity_id: EntityId, instance_id: impl Into<InstanceId>) -> Self {
        Self {
            entity_id,
            instance_id: instance_id.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.entity_id, self.instance_id)
    }
}

/// One registered occurrence of an entity.
///
/// Re-registering an existing instance replaces its metadata wholesale; there
/// is no field-level merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInstance {
    pub entity_id: EntityId,
    pub instance_id: InstanceId,

    #[serde(default)]
    pub metadata: InstanceMetadata,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EntityInstance {
    /// Creates a new instance record.
    #[must_use]
    pub fn new(
        entity_id: EntityId,
        instance_id: impl Into<InstanceId>,
        metadata: InstanceMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            entity_id,
            instance_id: instance_id.into(),
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns this instance's composite key.
    #[must_use]
    pub fn key(&self) -> InstanceKey {
        InstanceKey::new(self.entity_id, self.instance_id.clone())
    }

    /// Replaces the metadata wholesale and refreshes `updated_at`.
    pub fn replace_metadata(&mut self, metadata: InstanceMetadata) {
        self.metadata = metadata;
        self.updated_at = Utc::now();
    }
}

impl PartialEq for EntityInstance {
    fn eq(&self, other: &Self) -> bool {
        self.entity_id == other.entity_id && self.instance_id == other.instance_id
    }
}

impl Eq for EntityInstance {}
