//! # varstore - A Context-Qualified Variable Resolution Store
//!
//! varstore tracks typed entities per project, concrete instances of those
//! entities, and variables defined on an entity. For each (variable,
//! instance) pair the store holds one or more context-qualified values and
//! resolves, for a requested context, the most specific matching value.
//!
//! ## Core Concepts
//!
//! - **Entity**: a typed category of object, scoped to a project
//! - **Instance**: one concrete occurrence of an entity, identified by a
//!   caller-chosen string unique within that entity
//! - **Variable**: a named attribute on an entity; an external input or a
//!   value produced by a referenced external function (never executed here)
//! - **Context**: a key-value mapping qualifying when a value applies;
//!   resolution matches stored contexts by subset containment
//!
//! ## Usage
//!
//! ```rust
//! use varstore::{Context, InstanceMetadata, Value, VarEngine, Variable};
//! use serde_json::json;
//!
//! let engine = VarEngine::in_memory();
//!
//! let project = engine.create_project("pricing", "").unwrap();
//! let customer = engine.create_entity(project.id, "Customer", "").unwrap();
//! let discount = engine
//!     .create_variable(Variable::builder(customer.id, "discount").input())
//!     .unwrap();
//!
//! engine
//!     .register_instance(customer.id, "acme", InstanceMetadata::new())
//!     .unwrap();
//!
//! // Default slot plus an EU-qualified value.
//! engine
//!     .write_value(discount.id, "acme", Value::Float(0.05), None)
//!     .unwrap();
//! let eu: Context = [("region", json!("EU"))].into_iter().collect();
//! engine
//!     .write_value(discount.id, "acme", Value::Float(0.12), Some(eu))
//!     .unwrap();
//!
//! // A request carrying region=EU (and more) resolves the EU value.
//! let request: Context = [("region", json!("EU")), ("tier", json!("gold"))]
//!     .into_iter()
//!     .collect();
//! let row = engine
//!     .resolve_value(discount.id, "acme", Some(&request))
//!     .unwrap();
//! assert_eq!(row.value, Value::Float(0.12));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// Core types
pub mod context;
pub mod entity;
pub mod error;
pub mod instance;
pub mod project;
pub mod value;
pub mod variable;

// Planning, storage, and execution
pub mod deps;
pub mod engine;
pub mod guard;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use context::Context;
pub use deps::DependencyGraph;
pub use engine::{ResolveRequest, VarEngine};
pub use entity::{Entity, EntityId};
pub use error::{ReferenceError, ValidationError, VarError, VarResult};
pub use guard::IntegrityGuard;
pub use instance::{EntityInstance, InstanceId, InstanceKey, InstanceMetadata};
pub use project::{Project, ProjectId};
pub use storage::{
    EntityStore, InMemoryCatalogStore, InMemoryRegistry, InstanceStore, ProjectStore,
    StorageError, ValueStore, VariableStore,
};
pub use value::{Value, VariableValue};
pub use variable::{Variable, VariableBuilder, VariableId};
