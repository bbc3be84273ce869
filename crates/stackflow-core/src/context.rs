//! Program execution context
//!
//! A program runs once per deployment pass: it reads configuration, declares
//! resources in the order they are written and registers exports. The
//! context enforces the graph invariants while it is being built.

use crate::error::{Result, StackError};
use crate::graph::ResourceGraph;
use crate::property::{PropertyMap, PropertyValue};
use crate::resource::{ResourceArgs, ResourceDeclaration, ResourceHandle, ResourceOptions};
use crate::stack::{StackName, Urn};
use stackflow_config::{Config, ConfigStore};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// A declarative infrastructure program
pub trait Program: Send + Sync {
    /// Project name; also the default configuration namespace
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn run(&self, ctx: &mut ProgramContext) -> Result<()>;
}

/// Run `program` for `stack` and return the declared graph
#[instrument(skip(program, config), fields(program = program.name(), stack = %stack))]
pub fn run_program(
    program: &dyn Program,
    stack: StackName,
    config: ConfigStore,
) -> Result<ResourceGraph> {
    let mut ctx = ProgramContext::new(program.name(), stack, config);
    program.run(&mut ctx)?;
    let graph = ctx.finish();
    info!(
        resources = graph.len(),
        exports = graph.exports().len(),
        "Program declared its resources"
    );
    Ok(graph)
}

/// Builder state of one program run
#[derive(Debug)]
pub struct ProgramContext {
    project: String,
    stack: StackName,
    config: Arc<ConfigStore>,
    resources: Vec<ResourceDeclaration>,
    by_name: HashMap<String, usize>,
    exports: BTreeMap<String, PropertyValue>,
}

impl ProgramContext {
    pub fn new(project: impl Into<String>, stack: StackName, config: ConfigStore) -> Self {
        Self {
            project: project.into(),
            stack,
            config: Arc::new(config),
            resources: Vec::new(),
            by_name: HashMap::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn stack(&self) -> &StackName {
        &self.stack
    }

    /// Configuration in the project namespace
    pub fn config(&self) -> Config {
        Config::new(self.config.clone(), self.project.clone())
    }

    /// Configuration in another namespace (`aws`, `gcp`, ...)
    pub fn config_for(&self, namespace: &str) -> Config {
        Config::new(self.config.clone(), namespace)
    }

    /// Declare a typed resource
    pub fn register<A: ResourceArgs>(
        &mut self,
        name: &str,
        args: A,
        options: ResourceOptions,
    ) -> Result<ResourceHandle> {
        let resource_type = args.resource_type();
        let properties = args.into_properties()?;
        self.register_properties(name, resource_type, properties, options)
    }

    /// Declare a resource from a raw property bag
    pub fn register_properties(
        &mut self,
        name: &str,
        resource_type: &str,
        properties: PropertyMap,
        options: ResourceOptions,
    ) -> Result<ResourceHandle> {
        if name.is_empty() {
            return Err(StackError::InvalidArgs(format!(
                "{} requires a logical name",
                resource_type
            )));
        }
        if let Some(&index) = self.by_name.get(name) {
            return Err(StackError::DuplicateDeclaration {
                name: name.to_string(),
                existing: self.resources[index].urn.clone(),
            });
        }

        let mut dependencies = properties.dependencies();
        dependencies.extend(options.depends_on.iter().cloned());
        self.check_declared(name, &dependencies)?;

        let urn = Urn::new(&self.stack, &self.project, resource_type, name);
        debug!(
            urn = %urn,
            dependencies = dependencies.len(),
            "Registered resource"
        );

        self.by_name.insert(name.to_string(), self.resources.len());
        self.resources.push(ResourceDeclaration {
            urn: urn.clone(),
            name: name.to_string(),
            resource_type: resource_type.to_string(),
            properties,
            dependencies,
            options,
        });

        Ok(ResourceHandle::new(urn))
    }

    /// Register a named export
    pub fn export(&mut self, name: &str, value: impl Into<PropertyValue>) -> Result<()> {
        if self.exports.contains_key(name) {
            return Err(StackError::DuplicateExport(name.to_string()));
        }
        let value = value.into();
        self.check_declared(&format!("export {}", name), &value.dependencies())?;
        debug!(export = name, "Registered export");
        self.exports.insert(name.to_string(), value);
        Ok(())
    }

    fn check_declared(&self, from: &str, dependencies: &BTreeSet<Urn>) -> Result<()> {
        for dep in dependencies {
            let known = self
                .by_name
                .get(dep.name())
                .is_some_and(|&i| &self.resources[i].urn == dep);
            if !known {
                return Err(StackError::UnresolvedReference {
                    from: from.to_string(),
                    target: dep.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.by_name.get(name).map(|&i| &self.resources[i])
    }

    /// Close the pass. The returned graph is immutable.
    pub fn finish(self) -> ResourceGraph {
        ResourceGraph::new_unchecked(self.project, self.stack, self.resources, self.exports)
    }
}
