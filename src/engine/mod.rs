//! Execution engine for varstore.
//!
//! The engine is a synchronous front over pluggable storage backends. It
//! owns the cross-aggregate rules the backends do not: parents must exist
//! before children are created, variable definitions are validated before
//! insert, and every value write passes the integrity guard.
//!
//! Resolution is read-only and runs fully in parallel; write serialization
//! per (variable, instance, context) key is the backend's contract.

mod write_path;

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::deps::DependencyGraph;
use crate::entity::{Entity, EntityId};
use crate::error::{ReferenceError, ValidationError, VarError, VarResult};
use crate::instance::{EntityInstance, InstanceId, InstanceKey, InstanceMetadata};
use crate::project::{Project, ProjectId};
use crate::storage::{EntityStore, InstanceStore, ProjectStore, ValueStore, VariableStore};
use crate::storage::memory::{InMemoryCatalogStore, InMemoryRegistry};
use crate::value::VariableValue;
use crate::variable::{Variable, VariableBuilder, VariableId};

/// One item of a batch resolution request.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub variable_id: VariableId,
    pub instance_id: InstanceId,
    pub context: Option<Context>,
}

/// The variable resolution engine.
///
/// Holds one `Arc` per storage aggregate. The instance and value stores are
/// expected to be backed by the same object (as [`VarEngine::in_memory`]
/// wires them) or by a backend that otherwise honors the atomic
/// check-and-insert contract of [`ValueStore`].
pub struct VarEngine {
    projects: Arc<dyn ProjectStore>,
    entities: Arc<dyn EntityStore>,
    variables: Arc<dyn VariableStore>,
    instances: Arc<dyn InstanceStore>,
    values: Arc<dyn ValueStore>,
}

impl VarEngine {
    /// Creates an engine over the given stores.
    #[must_use]
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        entities: Arc<dyn EntityStore>,
        variables: Arc<dyn VariableStore>,
        instances: Arc<dyn InstanceStore>,
        values: Arc<dyn ValueStore>,
    ) -> Self {
        Self {
            projects,
            entities,
            variables,
            instances,
            values,
        }
    }

    /// Creates an engine over fresh in-memory backends.
    #[must_use]
    pub fn in_memory() -> Self {
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let registry = Arc::new(InMemoryRegistry::new());
        Self::new(
            catalog.clone(),
            catalog.clone(),
            catalog,
            registry.clone(),
            registry,
        )
    }

    // --- Catalog ---

    /// Creates a project.
    ///
    /// # Errors
    /// [`ValidationError::EmptyProjectName`] for a blank name.
    pub fn create_project(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> VarResult<Project> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName.into());
        }
        let project = Project::new(name, description);
        self.projects.insert(project.clone())?;
        debug!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// Edits a project's name and description.
    pub fn update_project(
        &self,
        id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> VarResult<Project> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName.into());
        }
        let mut project = self
            .projects
            .get(id)?
            .ok_or(ReferenceError::ProjectNotFound { id })?;
        project.rename(name, description);
        self.projects.update(project.clone())?;
        Ok(project)
    }

    /// Looks up a project by id.
    pub fn get_project(&self, id: ProjectId) -> VarResult<Option<Project>> {
        Ok(self.projects.get(id)?)
    }

    /// Lists all projects.
    pub fn list_projects(&self) -> VarResult<Vec<Project>> {
        Ok(self.projects.list()?)
    }

    /// Creates an entity under an existing project.
    ///
    /// # Errors
    /// [`ReferenceError::ProjectNotFound`] if the project does not exist.
    pub fn create_entity(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> VarResult<Entity> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyEntityName.into());
        }
        if self.projects.get(project_id)?.is_none() {
            return Err(ReferenceError::ProjectNotFound { id: project_id }.into());
        }
        let entity = Entity::new(project_id, name, description);
        self.entities.insert(entity.clone())?;
        debug!(entity_id = %entity.id, project_id = %project_id, "entity created");
        Ok(entity)
    }

    /// Looks up an entity by id.
    pub fn get_entity(&self, id: EntityId) -> VarResult<Option<Entity>> {
        Ok(self.entities.get(id)?)
    }

    /// Lists the entities belonging to a project.
    pub fn entities_in_project(&self, project_id: ProjectId) -> VarResult<Vec<Entity>> {
        Ok(self.entities.find_by_project(project_id)?)
    }

    /// Creates a variable from a validated definition.
    ///
    /// # Errors
    /// - [`ValidationError::MissingFunctionName`] for a non-input definition
    ///   without a function reference (nothing is persisted).
    /// - [`ReferenceError::EntityNotFound`] if the owning entity is unknown.
    pub fn create_variable(&self, definition: VariableBuilder) -> VarResult<Variable> {
        let variable = definition.build()?;
        if self.entities.get(variable.entity_id)?.is_none() {
            return Err(ReferenceError::EntityNotFound {
                id: variable.entity_id,
            }
            .into());
        }
        self.variables.insert(variable.clone())?;
        debug!(
            variable_id = %variable.id,
            entity_id = %variable.entity_id,
            name = %variable.name,
            is_input = variable.is_input,
            "variable created"
        );
        Ok(variable)
    }

    /// Looks up a variable by id.
    pub fn get_variable(&self, id: VariableId) -> VarResult<Option<Variable>> {
        Ok(self.variables.get(id)?)
    }

    /// Lists the variables defined on an entity.
    pub fn variables_for_entity(&self, entity_id: EntityId) -> VarResult<Vec<Variable>> {
        Ok(self.variables.find_by_entity(entity_id)?)
    }

    // --- Instance registry ---

    /// Registers an instance, or re-registers it replacing its metadata
    /// wholesale. Idempotent.
    ///
    /// # Errors
    /// - [`ValidationError::BlankInstanceId`] for a blank instance id.
    /// - [`ReferenceError::EntityNotFound`] if the entity is unknown.
    pub fn register_instance(
        &self,
        entity_id: EntityId,
        instance_id: impl Into<InstanceId>,
        metadata: InstanceMetadata,
    ) -> VarResult<EntityInstance> {
        let instance_id = instance_id.into();
        if instance_id.is_blank() {
            return Err(ValidationError::BlankInstanceId.into());
        }
        if self.entities.get(entity_id)?.is_none() {
            return Err(ReferenceError::EntityNotFound { id: entity_id }.into());
        }
        let stored = self
            .instances
            .upsert(EntityInstance::new(entity_id, instance_id, metadata))?;
        debug!(instance = %stored.key(), "instance registered");
        Ok(stored)
    }

    /// Strongly consistent existence check for an instance.
    pub fn instance_exists(
        &self,
        entity_id: EntityId,
        instance_id: impl Into<InstanceId>,
    ) -> VarResult<bool> {
        let key = InstanceKey::new(entity_id, instance_id);
        Ok(self.instances.exists(&key)?)
    }

    /// Looks up an instance record.
    pub fn get_instance(
        &self,
        entity_id: EntityId,
        instance_id: impl Into<InstanceId>,
    ) -> VarResult<Option<EntityInstance>> {
        let key = InstanceKey::new(entity_id, instance_id);
        Ok(self.instances.get(&key)?)
    }

    /// Lists the instances registered under an entity.
    pub fn instances_for_entity(&self, entity_id: EntityId) -> VarResult<Vec<EntityInstance>> {
        Ok(self.instances.find_by_entity(entity_id)?)
    }

    /// Removes a registration. Returns true if the instance existed.
    ///
    /// Retain-orphans policy: rows already stored for the instance stay
    /// readable, but any further write against it fails with
    /// [`VarError::UnregisteredInstance`].
    pub fn deregister_instance(
        &self,
        entity_id: EntityId,
        instance_id: impl Into<InstanceId>,
    ) -> VarResult<bool> {
        let key = InstanceKey::new(entity_id, instance_id);
        let removed = self.instances.remove(&key)?;
        if removed {
            debug!(instance = %key, "instance deregistered");
        }
        Ok(removed)
    }

    // --- Value resolution ---

    /// Resolves the most specific stored value for (variable, instance)
    /// under the requested context.
    ///
    /// With no context (or an empty one), only the default-context row
    /// matches. With a non-empty context, a stored row matches when its
    /// context is a non-empty subset of the request; among matches the most
    /// recently written row wins. There is no fallback to the default row.
    ///
    /// # Errors
    /// - [`ReferenceError::VariableNotFound`] for an unknown variable.
    /// - [`VarError::ValueNotFound`] when nothing matches — the normal
    ///   no-result outcome.
    pub fn resolve_value(
        &self,
        variable_id: VariableId,
        instance_id: impl Into<InstanceId>,
        context: Option<&Context>,
    ) -> VarResult<VariableValue> {
        let instance_id = instance_id.into();
        let variable = self
            .variables
            .get(variable_id)?
            .ok_or(ReferenceError::VariableNotFound { id: variable_id })?;
        let key = InstanceKey::new(variable.entity_id, instance_id.clone());

        let rows = self.values.find_by_pair(variable_id, &key)?;
        select_match(&rows, context)
            .cloned()
            .ok_or(VarError::ValueNotFound {
                variable_id,
                instance_id,
            })
    }

    /// Resolves a batch of requests independently; one miss does not abort
    /// the rest.
    #[must_use = "each element carries its own result"]
    pub fn resolve_many(&self, requests: Vec<ResolveRequest>) -> Vec<VarResult<VariableValue>> {
        requests
            .into_iter()
            .map(|req| self.resolve_value(req.variable_id, req.instance_id, req.context.as_ref()))
            .collect()
    }

    // --- Dependency planning ---

    /// Computes every variable name on `entity_id` needed to produce the
    /// requested outputs, given inputs already on hand. Pure planning; no
    /// function is executed.
    pub fn plan_required_variables(
        &self,
        entity_id: EntityId,
        requested_outputs: &[String],
        provided_inputs: &[String],
    ) -> VarResult<BTreeSet<String>> {
        let variables = self.variables.find_by_entity(entity_id)?;
        let graph = DependencyGraph::build(&variables);
        Ok(graph.required_variables(requested_outputs, provided_inputs))
    }
}

impl std::fmt::Debug for VarEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VarEngine").finish_non_exhaustive()
    }
}

/// Selects the row a resolution request should return, if any.
///
/// The empty stored context is the default slot: it matches only requests
/// that carry no qualifiers at all. Non-empty stored contexts match by
/// containment, most recent write winning ties.
fn select_match<'a>(
    rows: &'a [VariableValue],
    requested: Option<&Context>,
) -> Option<&'a VariableValue> {
    match requested {
        None => rows.iter().find(|row| row.context.is_empty()),
        Some(ctx) if ctx.is_empty() => rows.iter().find(|row| row.context.is_empty()),
        Some(ctx) => rows
            .iter()
            .filter(|row| !row.context.is_empty() && row.context.is_subset_of(ctx))
            .max_by_key(|row| row.write_seq),
    }
}
