use serde_json::json;
use varstore::{
    EntityId, InstanceMetadata, ProjectId, Value, VarEngine, Variable,
};

fn meta(pairs: &[(&str, serde_json::Value)]) -> InstanceMetadata {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.clone()))
        .collect()
}

#[test]
fn parent_must_exist_before_child() {
    let engine = VarEngine::in_memory();

    let err = engine
        .create_entity(ProjectId::new(), "Customer", "")
        .unwrap_err();
    assert!(err.is_reference());

    let err = engine
        .create_variable(Variable::builder(EntityId::new(), "age").input())
        .unwrap_err();
    assert!(err.is_reference());

    let err = engine
        .register_instance(EntityId::new(), "c-1", InstanceMetadata::new())
        .unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn non_input_variable_requires_function_name() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();

    let err = engine
        .create_variable(Variable::builder(entity.id, "score"))
        .unwrap_err();
    assert!(err.is_validation());

    let variable = engine
        .create_variable(Variable::builder(entity.id, "score").function("compute_score"))
        .unwrap();
    assert_eq!(variable.function_name.as_deref(), Some("compute_score"));
}

#[test]
fn write_against_unregistered_instance_creates_no_row() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();
    let variable = engine
        .create_variable(Variable::builder(entity.id, "age").input())
        .unwrap();

    let err = engine
        .write_value(variable.id, "never-registered", Value::Int(1), None)
        .unwrap_err();
    assert!(err.is_unregistered_instance());

    // Registering afterwards exposes no ghost row from the rejected write.
    engine
        .register_instance(entity.id, "never-registered", InstanceMetadata::new())
        .unwrap();
    let err = engine
        .resolve_value(variable.id, "never-registered", None)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn registration_is_idempotent() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();

    let m = meta(&[("region", json!("EU"))]);
    engine.register_instance(entity.id, "c-1", m.clone()).unwrap();
    engine.register_instance(entity.id, "c-1", m.clone()).unwrap();

    let instances = engine.instances_for_entity(entity.id).unwrap();
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].metadata, m);
}

#[test]
fn reregistration_replaces_metadata_wholesale() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();

    engine
        .register_instance(
            entity.id,
            "c-1",
            meta(&[("region", json!("EU")), ("tier", json!("gold"))]),
        )
        .unwrap();
    engine
        .register_instance(entity.id, "c-1", meta(&[("tier", json!("silver"))]))
        .unwrap();

    let stored = engine.get_instance(entity.id, "c-1").unwrap().unwrap();
    assert_eq!(stored.metadata.len(), 1);
    assert_eq!(stored.metadata["tier"], json!("silver"));
}

#[test]
fn upsert_overwrites_exact_context_slot() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();
    let variable = engine
        .create_variable(Variable::builder(entity.id, "age").input())
        .unwrap();
    engine
        .register_instance(entity.id, "c-1", InstanceMetadata::new())
        .unwrap();

    let first = engine
        .write_value(variable.id, "c-1", Value::from("A"), None)
        .unwrap();
    let second = engine
        .write_value(variable.id, "c-1", Value::from("B"), None)
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.write_seq > first.write_seq);

    let row = engine.resolve_value(variable.id, "c-1", None).unwrap();
    assert_eq!(row.value, Value::from("B"));
}

#[test]
fn instance_ids_are_scoped_to_their_entity() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let customer = engine.create_entity(project.id, "Customer", "").unwrap();
    let account = engine.create_entity(project.id, "Account", "").unwrap();

    engine
        .register_instance(customer.id, "x-1", InstanceMetadata::new())
        .unwrap();

    // Same instance id under a different entity is a different instance.
    assert!(engine.instance_exists(customer.id, "x-1").unwrap());
    assert!(!engine.instance_exists(account.id, "x-1").unwrap());

    let variable = engine
        .create_variable(Variable::builder(account.id, "balance").input())
        .unwrap();
    let err = engine
        .write_value(variable.id, "x-1", Value::Float(10.0), None)
        .unwrap_err();
    assert!(err.is_unregistered_instance());
}

#[test]
fn deregistered_instance_rejects_writes_retains_rows() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();
    let variable = engine
        .create_variable(Variable::builder(entity.id, "age").input())
        .unwrap();
    engine
        .register_instance(entity.id, "c-1", InstanceMetadata::new())
        .unwrap();
    engine
        .write_value(variable.id, "c-1", Value::Int(30), None)
        .unwrap();

    assert!(engine.deregister_instance(entity.id, "c-1").unwrap());
    assert!(!engine.instance_exists(entity.id, "c-1").unwrap());

    let err = engine
        .write_value(variable.id, "c-1", Value::Int(31), None)
        .unwrap_err();
    assert!(err.is_unregistered_instance());

    let row = engine.resolve_value(variable.id, "c-1", None).unwrap();
    assert_eq!(row.value, Value::Int(30));
}

#[test]
fn catalog_updates_do_not_touch_values() {
    let engine = VarEngine::in_memory();
    let project = engine.create_project("p", "original").unwrap();
    let entity = engine.create_entity(project.id, "Customer", "").unwrap();
    let variable = engine
        .create_variable(Variable::builder(entity.id, "age").input())
        .unwrap();
    engine
        .register_instance(entity.id, "c-1", InstanceMetadata::new())
        .unwrap();
    engine
        .write_value(variable.id, "c-1", Value::Int(30), None)
        .unwrap();

    let updated = engine.update_project(project.id, "p2", "edited").unwrap();
    assert_eq!(updated.name, "p2");

    let row = engine.resolve_value(variable.id, "c-1", None).unwrap();
    assert_eq!(row.value, Value::Int(30));
}
