//! Project types.
//!
//! A project is the top-level grouping unit: every entity belongs to exactly
//! one project, and entity names only need to be meaningful within it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique, stable project identifier.
///
/// Once created, a `ProjectId` never changes.
///
/// # Examples
///
/// ```
/// use varstore::ProjectId;
///
/// let id = ProjectId::new();
/// assert!(!id.is_nil());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a new random project ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a project ID from an existing UUID.
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

    /// Creates a nil project ID (for testing or sentinel values).
    #[must_use]
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProjectId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ProjectId> for Uuid {
    fn from(id: ProjectId) -> Self {
        id.0
    }
}

/// The top-level grouping unit for entities and their variables.
///
/// Projects carry no resolution logic of their own; they exist so catalogs
/// for unrelated domains can live side by side in one store.
///
/// # Examples
///
/// ```
/// use varstore::Project;
///
/// let project = Project::new("pricing", "Pricing model catalog");
/// assert_eq!(project.name, "pricing");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Globally unique identifier
    pub id: ProjectId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project with the given name and description.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a new project with a specific ID.
    ///
    /// Useful when the caller controls identity, such as during data
    /// migration or testing.
    #[must_use]
    pub fn with_id(
        id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the name and description, refreshing `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.name = name.into();
        self.description = description.into();
        self.touch();
    }

    /// Updates the `updated_at` timestamp.
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Project {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_creation() {
        let id1 = ProjectId::new();
        let id2 = ProjectId::new();
        assert_ne!(id1, id2);
        assert!(!id1.is_nil());
    }

    #[test]
    fn test_project_id_display() {
        let id = ProjectId::new();
        let display = format!("{id}");
        assert!(display.contains('-')); // UUID format
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("test", "a test project");
        assert_eq!(project.name, "test");
        assert_eq!(project.description, "a test project");
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_project_rename() {
        let mut project = Project::new("old", "");
        let created = project.created_at;
        project.rename("new", "renamed");
        assert_eq!(project.name, "new");
        assert_eq!(project.description, "renamed");
        assert_eq!(project.created_at, created);
        assert!(project.updated_at >= created);
    }

    #[test]
    fn test_project_equality_by_id() {
        let id = ProjectId::new();
        let a = Project::with_id(id, "a", "");
        let b = Project::with_id(id, "b", "different");
        assert_eq!(a, b);
    }

    #[test]
    fn test_project_serialization() {
        let project = Project::new("roundtrip", "");
        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(project.id, back.id);
        assert_eq!(project.name, back.name);
    }
}
