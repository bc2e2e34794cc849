//! The integrity guard.
//!
//! A precondition check, not a background process: every value write must
//! pass through it before anything is persisted. The guard itself is
//! stateless; it is a pure function of the instance registry's contents at
//! the moment of the check.
//!
//! The guard alone cannot close the race where an instance is deregistered
//! between check and write. That is closed at the storage boundary: the
//! [`crate::storage::ValueStore`] contract requires the backend to re-enforce
//! the constraint atomically with the commit (the in-memory backend does both
//! under one write guard). The explicit check here exists so rejected writes
//! fail early with a precise error, before the backend is touched.

use crate::error::{VarError, VarResult};
use crate::instance::InstanceKey;
use crate::storage::InstanceStore;

/// Stateless existence check over an instance registry.
#[derive(Clone, Copy)]
pub struct IntegrityGuard<'a> {
    instances: &'a dyn InstanceStore,
}

impl<'a> IntegrityGuard<'a> {
    /// Creates a guard over the given registry.
    #[must_use]
    pub fn new(instances: &'a dyn InstanceStore) -> Self {
        Self { instances }
    }

    /// Requires that the instance is currently registered.
    ///
    /// # Errors
    ///
    /// [`VarError::UnregisteredInstance`] if the (entity, instance id) pair
    /// is absent from the registry.
    pub fn ensure_registered(&self, instance: &InstanceKey) -> VarResult<()> {
        if self.instances.exists(instance)? {
            Ok(())
        } else {
            Err(VarError::UnregisteredInstance {
                instance: instance.clone(),
            })
        }
    }
}

impl std::fmt::Debug for IntegrityGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityGuard").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::instance::{EntityInstance, InstanceMetadata};
    use crate::storage::memory::InMemoryRegistry;

    #[test]
    fn test_guard_accepts_registered_instance() {
        let registry = InMemoryRegistry::new();
        let instance = EntityInstance::new(EntityId::new(), "c-1", InstanceMetadata::new());
        let key = instance.key();
        registry.upsert(instance).unwrap();

        let guard = IntegrityGuard::new(&registry);
        guard.ensure_registered(&key).unwrap();
    }

    #[test]
    fn test_guard_rejects_unknown_instance() {
        let registry = InMemoryRegistry::new();
        let key = InstanceKey::new(EntityId::new(), "ghost");

        let guard = IntegrityGuard::new(&registry);
        let err = guard.ensure_registered(&key).unwrap_err();
        assert!(err.is_unregistered_instance());
    }

    #[test]
    fn test_guard_sees_deregistration() {
        let registry = InMemoryRegistry::new();
        let instance = EntityInstance::new(EntityId::new(), "c-1", InstanceMetadata::new());
        let key = instance.key();
        registry.upsert(instance).unwrap();
        registry.remove(&key).unwrap();

        let guard = IntegrityGuard::new(&registry);
        assert!(guard.ensure_registered(&key).is_err());
    }
}
