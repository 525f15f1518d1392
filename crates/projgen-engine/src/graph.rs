use std::collections::{BTreeSet, HashMap};

use projgen_domain::{GraphManifest, ResourceDescriptor};

use crate::error::GraphError;

/// Resource descriptors keyed by name, kept in insertion order.
///
/// Every dependency must name a resource inserted earlier, a name such a
/// resource exports (the API activation node exports one name per API it
/// enables), or a name declared external. These rules are checked on insert,
/// so a constructed graph never has a dangling edge.
///
/// Names are unique unless shared with [`ResourceGraph::share_name`]. A
/// shared name resolves to its first holder.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    nodes: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
    external: BTreeSet<String>,
    shared: BTreeSet<String>,
}

impl ResourceGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept dependencies on `name` without a node in this graph.
    ///
    /// External references add no ordering constraint unless a node also
    /// answers to the name.
    pub fn declare_external(&mut self, name: impl Into<String>) {
        self.external.insert(name.into());
    }

    /// Allow more than one resource to carry `name`.
    pub fn share_name(&mut self, name: impl Into<String>) {
        self.shared.insert(name.into());
    }

    /// Append a descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error when the name is already taken or a dependency does not
    /// resolve to an earlier resource.
    pub fn insert(&mut self, descriptor: ResourceDescriptor) -> Result<(), GraphError> {
        self.insert_with_exports(descriptor, Vec::new())
    }

    /// Append a descriptor that also answers to `exports` in later
    /// dependency lists.
    ///
    /// # Errors
    ///
    /// Returns an error when the name or any export is already taken, or a
    /// dependency does not resolve to an earlier resource.
    pub fn insert_with_exports(
        &mut self,
        descriptor: ResourceDescriptor,
        exports: Vec<String>,
    ) -> Result<(), GraphError> {
        if self.index.contains_key(&descriptor.name) && !self.shared.contains(&descriptor.name) {
            return Err(GraphError::DuplicateResource {
                name: descriptor.name,
            });
        }

        if let Some(dependency) = descriptor.depends_on().iter().find(|dependency| {
            !self.index.contains_key(dependency.as_str())
                && !self.external.contains(dependency.as_str())
        }) {
            return Err(GraphError::DanglingDependency {
                resource: descriptor.name.clone(),
                dependency: dependency.clone(),
            });
        }

        let mut seen = BTreeSet::new();
        for export in &exports {
            if *export == descriptor.name || !seen.insert(export.as_str()) {
                continue;
            }
            if self.index.contains_key(export) {
                return Err(GraphError::DuplicateResource {
                    name: export.clone(),
                });
            }
        }

        let position = self.nodes.len();
        self.index.entry(descriptor.name.clone()).or_insert(position);
        for export in exports {
            self.index.entry(export).or_insert(position);
        }
        self.nodes.push(descriptor);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceDescriptor] {
        &self.nodes
    }

    /// Look up a resource by its own name. A shared name yields its first
    /// holder.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.index
            .get(name)
            .and_then(|position| self.nodes.get(*position))
            .filter(|descriptor| descriptor.name == name)
    }

    /// Resource a dependency reference resolves to, following exports.
    #[must_use]
    pub fn resolve(&self, reference: &str) -> Option<&ResourceDescriptor> {
        self.index
            .get(reference)
            .and_then(|position| self.nodes.get(*position))
    }

    /// Build a dependency-respecting order of resource names.
    ///
    /// Ties are broken by insertion order, so a graph built front to back comes
    /// out in the order it was built.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal index is inconsistent.
    pub fn execution_order(&self) -> Result<Vec<String>, GraphError> {
        let mut indegree = vec![0_usize; self.nodes.len()];
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for (position, descriptor) in self.nodes.iter().enumerate() {
            let mut parents = BTreeSet::new();
            for dependency in descriptor.depends_on() {
                let Some(parent) = self.index.get(dependency.as_str()) else {
                    if self.external.contains(dependency.as_str()) {
                        continue;
                    }
                    return Err(GraphError::Invariant {
                        message: format!(
                            "internal graph error: `{}` lost dependency `{dependency}`",
                            descriptor.name
                        ),
                    });
                };
                parents.insert(*parent);
            }
            for parent in parents {
                adjacency[parent].push(position);
                indegree[position] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter_map(|(position, count)| (*count == 0).then_some(position))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = ready.pop_first() {
            order.push(self.nodes[next].name.clone());
            for neighbor in &adjacency[next] {
                indegree[*neighbor] -= 1;
                if indegree[*neighbor] == 0 {
                    ready.insert(*neighbor);
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(GraphError::Invariant {
                message: "internal graph error: dependency edges do not form a DAG".to_string(),
            });
        }

        Ok(order)
    }

    #[must_use]
    pub fn into_manifest(self) -> GraphManifest {
        GraphManifest {
            resources: self.nodes,
        }
    }
}
