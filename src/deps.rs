//! Variable dependency planning.
//!
//! Computed variables declare which other variables their external function
//! reads (`input_variables`). Before pulling data for a computation run, a
//! caller needs the transitive closure of those dependencies over the
//! variables it wants and the inputs it already has. This module computes
//! that closure; it never executes anything.

use std::collections::{BTreeSet, HashMap};

use crate::variable::Variable;

/// Name-keyed dependency graph over one entity's variables.
///
/// # Examples
///
/// ```
/// use varstore::{DependencyGraph, EntityId, Variable};
///
/// let entity_id = EntityId::new();
/// let age = Variable::builder(entity_id, "age").input().build().unwrap();
/// let score = Variable::builder(entity_id, "score")
///     .function("compute_score")
///     .depends_on("age")
///     .build()
///     .unwrap();
///
/// let graph = DependencyGraph::build(&[age, score]);
/// let required = graph.required_variables(&["score".to_string()], &[]);
/// assert!(required.contains("age"));
/// assert!(required.contains("score"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    deps: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Builds the graph from variable definitions.
    ///
    /// Later definitions win on duplicate names, matching a last-writer-wins
    /// catalog lookup.
    #[must_use]
    pub fn build(variables: &[Variable]) -> Self {
        let deps = variables
            .iter()
            .map(|v| (v.name.clone(), v.input_variables.clone()))
            .collect();
        Self { deps }
    }

    /// Returns true if a variable with this name is in the graph.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.deps.contains_key(name)
    }

    /// Direct dependencies of a variable, or empty for unknown names.
    #[must_use]
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.deps.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every variable name needed to produce `requested_outputs`, given that
    /// `provided_inputs` are already on hand.
    ///
    /// The result is the transitive dependency closure over both sets. Names
    /// absent from the graph stay in the result so the caller can surface
    /// them, rather than being silently dropped.
    #[must_use]
    pub fn required_variables(
        &self,
        requested_outputs: &[String],
        provided_inputs: &[String],
    ) -> BTreeSet<String> {
        let mut required: BTreeSet<String> = requested_outputs
            .iter()
            .chain(provided_inputs)
            .cloned()
            .collect();

        let mut to_process: Vec<String> = required.iter().cloned().collect();
        while let Some(name) = to_process.pop() {
            for dep in self.dependencies_of(&name) {
                if required.insert(dep.clone()) {
                    to_process.push(dep.clone());
                }
            }
        }
        required
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    fn input(entity_id: EntityId, name: &str) -> Variable {
        Variable::builder(entity_id, name).input().build().unwrap()
    }

    fn computed(entity_id: EntityId, name: &str, deps: &[&str]) -> Variable {
        let mut builder = Variable::builder(entity_id, name).function(format!("compute_{name}"));
        for dep in deps {
            builder = builder.depends_on(*dep);
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_closure_follows_chains() {
        let e = EntityId::new();
        let vars = vec![
            input(e, "age"),
            input(e, "income"),
            computed(e, "ratio", &["age", "income"]),
            computed(e, "score", &["ratio"]),
        ];
        let graph = DependencyGraph::build(&vars);

        let required = graph.required_variables(&["score".to_string()], &[]);
        let expected: BTreeSet<String> = ["age", "income", "ratio", "score"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(required, expected);
    }

    #[test]
    fn test_provided_inputs_are_included() {
        let e = EntityId::new();
        let graph = DependencyGraph::build(&[input(e, "age")]);
        let required = graph.required_variables(&[], &["age".to_string()]);
        assert!(required.contains("age"));
        assert_eq!(required.len(), 1);
    }

    #[test]
    fn test_unknown_names_are_kept_not_dropped() {
        let graph = DependencyGraph::build(&[]);
        let required = graph.required_variables(&["mystery".to_string()], &[]);
        assert!(required.contains("mystery"));
    }

    #[test]
    fn test_cycles_terminate() {
        let e = EntityId::new();
        let vars = vec![
            computed(e, "a", &["b"]),
            computed(e, "b", &["a"]),
        ];
        let graph = DependencyGraph::build(&vars);
        let required = graph.required_variables(&["a".to_string()], &[]);
        assert!(required.contains("a"));
        assert!(required.contains("b"));
        assert_eq!(required.len(), 2);
    }

    #[test]
    fn test_dependencies_of_unknown_is_empty() {
        let graph = DependencyGraph::build(&[]);
        assert!(graph.dependencies_of("nope").is_empty());
        assert!(!graph.contains("nope"));
    }
}
