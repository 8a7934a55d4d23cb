//! Dependency graph over declared type requirements and touches
//!
//! Used to find the cyclic clusters the trigger list has to cover.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::registry::TypeRegistry;

/// Directed graph: type → types it requires or touches.
///
/// Node order is deterministic (sorted by name) so reports are stable.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every registered type's `requires` and `touches`.
    pub fn from_registry(registry: &TypeRegistry) -> Self {
        let mut graph = Self::new();
        for def in registry.types() {
            graph.add_type(def.name().to_string());
            for dep in def.required().iter().chain(def.touched()) {
                graph.add_dependency(def.name().to_string(), dep.clone());
            }
        }
        graph
    }

    /// Add a type with no dependencies.
    pub fn add_type(&mut self, name: String) {
        self.edges.entry(name).or_default();
    }

    /// Record that initializing `name` initializes `depends_on`.
    pub fn add_dependency(&mut self, name: String, depends_on: String) {
        self.edges.entry(name).or_default().push(depends_on.clone());
        self.edges.entry(depends_on).or_default();
    }

    /// Number of types in the graph.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every type reachable from `roots`, roots included.
    pub fn reachable_from<'a, I>(&self, roots: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<String> = roots.into_iter().map(str::to_string).collect();
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            if let Some(deps) = self.edges.get(&node) {
                stack.extend(deps.iter().filter(|d| !seen.contains(*d)).cloned());
            }
        }
        seen
    }

    /// Cyclic clusters: strongly connected components with more than one
    /// member, or a single member that requires itself. Members are sorted.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut tarjan = Tarjan::new(self);
        for node in self.edges.keys() {
            if !tarjan.index.contains_key(node.as_str()) {
                tarjan.visit(node);
            }
        }

        let mut cycles: Vec<Vec<String>> = tarjan
            .components
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .edges
                        .get(component[0])
                        .is_some_and(|deps| deps.iter().any(|d| d == component[0]))
            })
            .map(|component| {
                let mut names: Vec<String> = component.into_iter().map(str::to_string).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }
}

/// Tarjan's strongly connected components.
struct Tarjan<'g> {
    graph: &'g DependencyGraph,
    next_index: usize,
    index: HashMap<&'g str, usize>,
    lowlink: HashMap<&'g str, usize>,
    stack: Vec<&'g str>,
    on_stack: BTreeSet<&'g str>,
    components: Vec<Vec<&'g str>>,
}

impl<'g> Tarjan<'g> {
    fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            next_index: 0,
            index: HashMap::new(),
            lowlink: HashMap::new(),
            stack: Vec::new(),
            on_stack: BTreeSet::new(),
            components: Vec::new(),
        }
    }

    fn visit(&mut self, node: &'g str) {
        self.index.insert(node, self.next_index);
        self.lowlink.insert(node, self.next_index);
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack.insert(node);

        let graph = self.graph;
        if let Some(deps) = graph.edges.get(node) {
            for dep in deps {
                let dep = dep.as_str();
                if !self.index.contains_key(dep) {
                    self.visit(dep);
                    let low = self.lowlink[node].min(self.lowlink[dep]);
                    self.lowlink.insert(node, low);
                } else if self.on_stack.contains(dep) {
                    let low = self.lowlink[node].min(self.index[dep]);
                    self.lowlink.insert(node, low);
                }
            }
        }

        if self.lowlink[node] == self.index[node] {
            let mut component = Vec::new();
            while let Some(member) = self.stack.pop() {
                self.on_stack.remove(member);
                component.push(member);
                if member == node {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}
