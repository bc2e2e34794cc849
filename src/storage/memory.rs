//! In-memory storage backend.
//!
//! This module provides thread-safe in-memory implementations of the storage
//! traits. It is intended for embedded usage, tests, and as a reference
//! implementation for persistent backends.
//!
//! The registry backend keeps instances and value rows under a single lock so
//! the instance-existence check and the value commit are one critical
//! section, which is what the [`crate::storage::ValueStore`] contract
//! requires.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::context::Context;
use crate::entity::{Entity, EntityId};
use crate::instance::{EntityInstance, InstanceKey};
use crate::project::{Project, ProjectId};
use crate::storage::traits::{
    EntityStore, InstanceStore, ProjectStore, StorageError, ValueStore, VariableStore,
};
use crate::value::{Value, VariableValue};
use crate::variable::{Variable, VariableId};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct EntityState {
    by_id: HashMap<EntityId, Entity>,
    by_project: HashMap<ProjectId, Vec<EntityId>>,
}

#[derive(Debug, Default)]
struct VariableState {
    by_id: HashMap<VariableId, Variable>,
    by_entity: HashMap<EntityId, Vec<VariableId>>,
}

/// In-memory catalog backend: projects, entities, and variable definitions.
///
/// Catalog aggregates are independent, so each lives under its own lock;
/// cross-aggregate checks (project-before-entity and so on) belong to the
/// engine, not the backend.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
    entities: RwLock<EntityState>,
    variables: RwLock<VariableState>,
}

impl InMemoryCatalogStore {
    /// Creates an empty catalog store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectStore for InMemoryCatalogStore {
    fn insert(&self, project: Project) -> Result<(), StorageError> {
        let mut projects = self.projects.write().map_err(|_| lock_err("projects"))?;
        if projects.contains_key(&project.id) {
            return Err(StorageError::DuplicateKey(project.id.to_string()));
        }
        projects.insert(project.id, project);
        Ok(())
    }

    fn get(&self, id: ProjectId) -> Result<Option<Project>, StorageError> {
        let projects = self.projects.read().map_err(|_| lock_err("projects"))?;
        Ok(projects.get(&id).cloned())
    }

    fn update(&self, project: Project) -> Result<(), StorageError> {
        let mut projects = self.projects.write().map_err(|_| lock_err("projects"))?;
        if !projects.contains_key(&project.id) {
            return Err(StorageError::ProjectNotFound(project.id));
        }
        projects.insert(project.id, project);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Project>, StorageError> {
        let projects = self.projects.read().map_err(|_| lock_err("projects"))?;
        Ok(projects.values().cloned().collect())
    }
}

impl EntityStore for InMemoryCatalogStore {
    fn insert(&self, entity: Entity) -> Result<(), StorageError> {
        let mut state = self.entities.write().map_err(|_| lock_err("entities"))?;
        if state.by_id.contains_key(&entity.id) {
            return Err(StorageError::DuplicateKey(entity.id.to_string()));
        }
        state
            .by_project
            .entry(entity.project_id)
            .or_default()
            .push(entity.id);
        state.by_id.insert(entity.id, entity);
        Ok(())
    }

    fn get(&self, id: EntityId) -> Result<Option<Entity>, StorageError> {
        let state = self.entities.read().map_err(|_| lock_err("entities"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn update(&self, entity: Entity) -> Result<(), StorageError> {
        let mut state = self.entities.write().map_err(|_| lock_err("entities"))?;
        if !state.by_id.contains_key(&entity.id) {
            return Err(StorageError::EntityNotFound(entity.id));
        }
        state.by_id.insert(entity.id, entity);
        Ok(())
    }

    fn find_by_project(&self, project_id: ProjectId) -> Result<Vec<Entity>, StorageError> {
        let state = self.entities.read().map_err(|_| lock_err("entities"))?;
        let ids = state.by_project.get(&project_id);
        Ok(ids
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl VariableStore for InMemoryCatalogStore {
    fn insert(&self, variable: Variable) -> Result<(), StorageError> {
        let mut state = self.variables.write().map_err(|_| lock_err("variables"))?;
        if state.by_id.contains_key(&variable.id) {
            return Err(StorageError::DuplicateKey(variable.id.to_string()));
        }
        state
            .by_entity
            .entry(variable.entity_id)
            .or_default()
            .push(variable.id);
        state.by_id.insert(variable.id, variable);
        Ok(())
    }

    fn get(&self, id: VariableId) -> Result<Option<Variable>, StorageError> {
        let state = self.variables.read().map_err(|_| lock_err("variables"))?;
        Ok(state.by_id.get(&id).cloned())
    }

    fn find_by_entity(&self, entity_id: EntityId) -> Result<Vec<Variable>, StorageError> {
        let state = self.variables.read().map_err(|_| lock_err("variables"))?;
        let ids = state.by_entity.get(&entity_id);
        Ok(ids
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

type PairKey = (VariableId, InstanceKey);

#[derive(Debug, Default)]
struct RegistryState {
    instances: HashMap<InstanceKey, EntityInstance>,
    /// Rows keyed by (variable, instance) pair, then by the exact-context
    /// canonical key. At most one row per exact context.
    values: HashMap<PairKey, HashMap<String, VariableValue>>,
    /// Monotonic write counter; the resolution recency tie-break.
    write_seq: u64,
}

/// In-memory instance registry and value store.
///
/// Both aggregates share one `RwLock` on purpose: a value upsert checks the
/// referenced instance and commits the row under the same write guard, so a
/// registration or deregistration can never slip between check and write.
/// Resolves take the read side and run fully in parallel.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
}

impl InMemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstanceStore for InMemoryRegistry {
    fn upsert(&self, instance: EntityInstance) -> Result<EntityInstance, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("registry"))?;
        let key = instance.key();
        let stored = match state.instances.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().replace_metadata(instance.metadata);
                slot.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(instance).clone(),
        };
        Ok(stored)
    }

    fn get(&self, key: &InstanceKey) -> Result<Option<EntityInstance>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry"))?;
        Ok(state.instances.get(key).cloned())
    }

    fn exists(&self, key: &InstanceKey) -> Result<bool, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry"))?;
        Ok(state.instances.contains_key(key))
    }

    fn remove(&self, key: &InstanceKey) -> Result<bool, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("registry"))?;
        // Value rows are retained; only the registration goes away.
        Ok(state.instances.remove(key).is_some())
    }

    fn find_by_entity(&self, entity_id: EntityId) -> Result<Vec<EntityInstance>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry"))?;
        Ok(state
            .instances
            .values()
            .filter(|i| i.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

impl ValueStore for InMemoryRegistry {
    fn upsert(
        &self,
        variable_id: VariableId,
        instance: InstanceKey,
        context: Context,
        value: Value,
    ) -> Result<VariableValue, StorageError> {
        let mut state = self.state.write().map_err(|_| lock_err("registry"))?;

        // Integrity constraint, enforced in the same critical section as the
        // commit below.
        if !state.instances.contains_key(&instance) {
            return Err(StorageError::UnregisteredInstance { instance });
        }

        state.write_seq += 1;
        let seq = state.write_seq;
        let ctx_key = context.canonical_key();

        let rows = state
            .values
            .entry((variable_id, instance.clone()))
            .or_default();

        let stored = match rows.entry(ctx_key) {
            Entry::Occupied(mut slot) => {
                // Exact-context hit: replace the value, keep the row.
                slot.get_mut().overwrite(value, seq);
                slot.get().clone()
            }
            Entry::Vacant(slot) => slot
                .insert(VariableValue::new(variable_id, instance, context, value, seq))
                .clone(),
        };
        Ok(stored)
    }

    fn find_by_pair(
        &self,
        variable_id: VariableId,
        instance: &InstanceKey,
    ) -> Result<Vec<VariableValue>, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry"))?;
        let mut rows: Vec<VariableValue> = state
            .values
            .get(&(variable_id, instance.clone()))
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|r| r.write_seq);
        Ok(rows)
    }

    fn count_by_pair(
        &self,
        variable_id: VariableId,
        instance: &InstanceKey,
    ) -> Result<usize, StorageError> {
        let state = self.state.read().map_err(|_| lock_err("registry"))?;
        Ok(state
            .values
            .get(&(variable_id, instance.clone()))
            .map_or(0, HashMap::len))
    }
}
