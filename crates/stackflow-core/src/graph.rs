//! Write-once resource graphs

use crate::error::{Result, StackError};
use crate::property::PropertyValue;
use crate::resource::ResourceDeclaration;
use crate::stack::{StackName, Urn};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Result of one program run: every declaration plus the export mapping
#[derive(Debug, Clone, Serialize)]
pub struct ResourceGraph {
    project: String,
    stack: StackName,
    resources: Vec<ResourceDeclaration>,
    exports: BTreeMap<String, PropertyValue>,
}

impl ResourceGraph {
    /// Assemble a graph from parts, checking every structural invariant
    pub fn from_parts(
        project: impl Into<String>,
        stack: StackName,
        resources: Vec<ResourceDeclaration>,
        exports: BTreeMap<String, PropertyValue>,
    ) -> Result<Self> {
        let graph = Self {
            project: project.into(),
            stack,
            resources,
            exports,
        };
        graph.validate()?;
        Ok(graph)
    }

    /// Used by `ProgramContext`, which enforces the invariants while building
    pub(crate) fn new_unchecked(
        project: String,
        stack: StackName,
        resources: Vec<ResourceDeclaration>,
        exports: BTreeMap<String, PropertyValue>,
    ) -> Self {
        Self {
            project,
            stack,
            resources,
            exports,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    /// Declarations in the order they were written
    pub fn resources(&self) -> &[ResourceDeclaration] {
        &self.resources
    }

    pub fn exports(&self) -> &BTreeMap<String, PropertyValue> {
        &self.exports
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceDeclaration> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Unique logical names and no dangling or circular references
    pub fn validate(&self) -> Result<()> {
        let mut names: HashMap<&str, &Urn> = HashMap::new();
        for resource in &self.resources {
            if let Some(existing) = names.insert(&resource.name, &resource.urn) {
                return Err(StackError::DuplicateDeclaration {
                    name: resource.name.clone(),
                    existing: existing.clone(),
                });
            }
        }

        let declared: HashSet<&Urn> = self.resources.iter().map(|r| &r.urn).collect();
        for resource in &self.resources {
            if let Some(target) = resource.dependencies.iter().find(|d| !declared.contains(d)) {
                return Err(StackError::UnresolvedReference {
                    from: resource.name.clone(),
                    target: target.clone(),
                });
            }
        }
        for (name, value) in &self.exports {
            if let Some(target) = value
                .dependencies()
                .into_iter()
                .find(|d| !declared.contains(d))
            {
                return Err(StackError::UnresolvedReference {
                    from: format!("export {}", name),
                    target,
                });
            }
        }

        self.dependency_order().map(|_| ())
    }

    /// Declarations ordered so that every dependency comes first
    ///
    /// Ties keep declaration order, so a graph written in dependency order
    /// comes back unchanged.
    pub fn dependency_order(&self) -> Result<Vec<&ResourceDeclaration>> {
        let index: HashMap<&Urn, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (&r.urn, i))
            .collect();

        let mut in_degree = vec![0usize; self.resources.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.resources.len()];
        for (i, resource) in self.resources.iter().enumerate() {
            for dep in &resource.dependencies {
                if let Some(&j) = index.get(dep) {
                    in_degree[i] += 1;
                    dependents[j].push(i);
                }
            }
        }

        let mut ready: std::collections::BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut ordered = Vec::with_capacity(self.resources.len());

        while let Some(i) = ready.pop_first() {
            ordered.push(&self.resources[i]);
            for &k in &dependents[i] {
                in_degree[k] -= 1;
                if in_degree[k] == 0 {
                    ready.insert(k);
                }
            }
        }

        if ordered.len() != self.resources.len() {
            let stuck: Vec<&str> = self
                .resources
                .iter()
                .enumerate()
                .filter(|(i, _)| in_degree[*i] > 0)
                .map(|(_, r)| r.name.as_str())
                .collect();
            return Err(StackError::CircularDependency(stuck.join(" -> ")));
        }

        Ok(ordered)
    }
}
