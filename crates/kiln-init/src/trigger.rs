//! Trigger lists
//!
//! A trigger list names one entry point per cyclic cluster, in the order the
//! clusters depend on each other. It is curated by hand: later entries may
//! assume earlier ones are already initialized.

use std::collections::HashSet;

use crate::error::TriggerListError;
use crate::graph::DependencyGraph;
use crate::registry::TypeRegistry;

/// Ordered, duplicate-free list of fully-qualified type names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TriggerList {
    names: Vec<String>,
}

impl TriggerList {
    /// Build a trigger list, keeping declaration order.
    pub fn new<I, S>(names: I) -> Result<Self, TriggerListError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut list = Vec::new();
        for (position, name) in names.into_iter().enumerate() {
            let name: String = name.into();
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(TriggerListError::EmptyName(position));
            }
            if !seen.insert(name.clone()) {
                return Err(TriggerListError::Duplicate(name));
            }
            list.push(name);
        }
        Ok(Self { names: list })
    }

    /// Trigger names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterate over trigger names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Number of triggers.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Cycles of the registry's declared graph that no trigger reaches.
    ///
    /// Edges are `requires` and declared `touches`. Touches an initializer
    /// makes without declaring them are invisible here.
    pub fn uncovered_cycles(&self, registry: &TypeRegistry) -> Vec<Vec<String>> {
        let graph = DependencyGraph::from_registry(registry);
        let reached = graph.reachable_from(self.iter());
        graph
            .cycles()
            .into_iter()
            .filter(|cycle| !cycle.iter().any(|member| reached.contains(member)))
            .collect()
    }
}
