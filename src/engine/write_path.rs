//! Engine write path.
//!
//! The guarded sequence for every value write: resolve the variable to its
//! owning entity, run the integrity guard against the instance registry,
//! then hand the row to the value store, whose upsert re-enforces the
//! instance constraint atomically with the commit. A rejected write leaves
//! no state behind at any step.

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{ReferenceError, VarError, VarResult};
use crate::guard::IntegrityGuard;
use crate::instance::{InstanceId, InstanceKey};
use crate::storage::StorageError;
use crate::value::{Value, VariableValue};
use crate::variable::VariableId;

use super::VarEngine;

impl VarEngine {
    /// Writes a context-qualified value for (variable, instance).
    ///
    /// `context` defaults to the empty mapping, i.e. the default slot. The
    /// exact context is part of the row's identity: writing to an existing
    /// (variable, instance, context) triple overwrites that row's value and
    /// refreshes its update timestamp; any other context creates a new row.
    ///
    /// # Errors
    /// - [`ReferenceError::VariableNotFound`] for an unknown variable.
    /// - [`VarError::UnregisteredInstance`] when the instance is absent from
    ///   the registry; the write is fully rejected.
    pub fn write_value(
        &self,
        variable_id: VariableId,
        instance_id: impl Into<InstanceId>,
        value: Value,
        context: Option<Context>,
    ) -> VarResult<VariableValue> {
        let variable = self
            .variables
            .get(variable_id)?
            .ok_or(ReferenceError::VariableNotFound { id: variable_id })?;
        let instance = InstanceKey::new(variable.entity_id, instance_id);
        let context = context.unwrap_or_default();

        // Precondition check; fails fast with a precise error. The backend
        // repeats it inside the commit's critical section, so an instance
        // deregistered after this point still cannot gain a row.
        let guard = IntegrityGuard::new(self.instances.as_ref());
        if let Err(err) = guard.ensure_registered(&instance) {
            warn!(
                variable_id = %variable_id,
                instance = %instance,
                "value write rejected: instance not registered"
            );
            return Err(err);
        }

        let stored = self
            .values
            .upsert(variable_id, instance, context, value)
            .map_err(|err| match err {
                StorageError::UnregisteredInstance { instance } => {
                    warn!(
                        variable_id = %variable_id,
                        instance = %instance,
                        "value write rejected at commit: instance not registered"
                    );
                    VarError::UnregisteredInstance { instance }
                }
                other => VarError::Storage(other),
            })?;

        debug!(
            variable_id = %variable_id,
            instance = %stored.instance,
            context = %stored.context,
            write_seq = stored.write_seq,
            "value written"
        );
        Ok(stored)
    }
}
