//! Local deployment engine
//!
//! Materializes a [`ResourceGraph`] against registered providers: resources
//! are applied one by one in dependency order, each one's inputs resolved
//! from the outputs of what came before. State and exports are persisted
//! per stack by the [`StackStore`].

use crate::action::{OperationResult, StepOp};
use crate::error::{CloudError, Result};
use crate::provider::{ProvisionRequest, ResourceProvider};
use crate::state::{ResourceState, StackState, StackStore};
use serde_json::{Map, Value, json};
use stackflow_core::{
    ResourceDeclaration, ResourceGraph, STACK_REFERENCE_TYPE, StackName, StackReferenceName, Urn,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Organization used for stacks deployed by this engine
pub const DEFAULT_ORGANIZATION: &str = "organization";

/// Result of an `up`
#[derive(Debug, Clone)]
pub struct UpResult {
    pub operation: OperationResult,
    /// Resolved exports
    pub outputs: BTreeMap<String, Value>,
}

/// Deployment engine backed by local state files
pub struct LocalEngine {
    store: StackStore,
    providers: HashMap<String, Arc<dyn ResourceProvider>>,
}

impl LocalEngine {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            store: StackStore::new(project_root),
            providers: HashMap::new(),
        }
    }

    /// Register a provider for its package
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.register_provider(provider);
        self
    }

    pub fn register_provider(&mut self, provider: Arc<dyn ResourceProvider>) {
        debug!(package = provider.package(), "Registered provider");
        self.providers.insert(provider.package().to_string(), provider);
    }

    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ResourceProvider>> {
        self.providers.values()
    }

    pub fn store(&self) -> &StackStore {
        &self.store
    }

    fn reference(&self, project: &str, stack: &StackName) -> Result<StackReferenceName> {
        Ok(StackReferenceName::new(
            DEFAULT_ORGANIZATION,
            project,
            stack.clone(),
        )?)
    }

    fn provider_for(&self, resource_type: &str) -> Result<&Arc<dyn ResourceProvider>> {
        let package = resource_type.split(':').next().unwrap_or_default();
        self.providers
            .get(package)
            .ok_or_else(|| CloudError::ProviderNotFound(package.to_string()))
    }

    /// Deploy `graph`, replacing the stack's previous state
    #[instrument(skip(self, graph), fields(project = graph.project(), stack = %graph.stack()))]
    pub async fn up(&self, graph: &ResourceGraph) -> Result<UpResult> {
        let started = Instant::now();
        let reference = self.reference(graph.project(), graph.stack())?;
        let lock = self.store.acquire_lock(&reference).await?;

        let prior = self
            .store
            .load(&reference)
            .await?
            .unwrap_or_else(|| StackState::new(graph.project(), graph.stack().clone()));

        graph.validate()?;
        let order = graph.dependency_order()?;

        let declared: HashSet<&Urn> = order.iter().map(|d| &d.urn).collect();
        let removed: Vec<&ResourceState> = prior
            .resources
            .iter()
            .rev()
            .filter(|r| !declared.contains(&r.urn))
            .collect();
        if let Some(protected) = removed.iter().find(|r| r.protect) {
            return Err(CloudError::ProtectedResource(protected.urn.to_string()));
        }

        let mut operation = OperationResult::new();
        let mut next = StackState::new(graph.project(), graph.stack().clone());
        let mut resolved: HashMap<Urn, Value> = HashMap::new();

        for decl in order {
            let inputs = decl.properties.resolve(&resolved)?;
            let previous = prior.get_resource(&decl.urn);

            let (op, mut state) = match previous {
                Some(previous)
                    if previous.inputs == inputs && decl.resource_type != STACK_REFERENCE_TYPE =>
                {
                    (StepOp::Same, previous.clone())
                }
                _ => {
                    let state = self.apply(decl, inputs, previous).await?;
                    let op = match previous {
                        Some(p) if p.inputs == state.inputs => StepOp::Same,
                        Some(_) => StepOp::Update,
                        None => StepOp::Create,
                    };
                    (op, state)
                }
            };

            debug!(urn = %decl.urn, op = %op, "Applied resource");
            operation.push(decl.urn.clone(), op, state.id.clone());
            resolved.insert(decl.urn.clone(), state.outputs.clone());

            state.dependencies = decl.dependencies.iter().cloned().collect();
            state.protect = decl.options.protect;
            next.set_resource(state);
        }

        for state in removed {
            self.delete_resource(state).await?;
            operation.push(state.urn.clone(), StepOp::Delete, state.id.clone());
        }

        for (name, value) in graph.exports() {
            next.outputs.insert(name.clone(), value.resolve(&resolved)?);
        }

        self.store.save(&reference, &next).await?;
        lock.release().await?;

        operation.duration_ms = started.elapsed().as_millis() as u64;
        info!(summary = %operation.summary(), "Stack updated");

        Ok(UpResult {
            operation,
            outputs: next.outputs,
        })
    }

    /// Create or update one declaration
    async fn apply(
        &self,
        decl: &ResourceDeclaration,
        inputs: Value,
        previous: Option<&ResourceState>,
    ) -> Result<ResourceState> {
        if decl.resource_type == STACK_REFERENCE_TYPE {
            return self.read_stack_reference(decl, inputs, previous).await;
        }

        let provider = self.provider_for(&decl.resource_type)?;
        let request = ProvisionRequest {
            urn: decl.urn.clone(),
            resource_type: decl.resource_type.clone(),
            inputs,
        };

        let response = match previous {
            Some(previous) => provider.update(previous, &request).await?,
            None => provider.create(&request).await?,
        };

        let mut outputs = match &request.inputs {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        outputs.extend(response.outputs);
        outputs.insert("id".to_string(), Value::String(response.id.clone()));

        let mut state = ResourceState::new(
            decl.urn.clone(),
            response.id,
            request.inputs,
            Value::Object(outputs),
        );
        if let Some(previous) = previous {
            state.created_at = previous.created_at;
        }
        Ok(state)
    }

    /// Stack references are read on every pass so they track the other stack
    async fn read_stack_reference(
        &self,
        decl: &ResourceDeclaration,
        inputs: Value,
        previous: Option<&ResourceState>,
    ) -> Result<ResourceState> {
        let name = inputs
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CloudError::provider(&decl.urn, "stack reference has no name"))?;
        let reference: StackReferenceName = name.parse()?;
        let exports = self.stack_outputs(&reference).await?;

        let outputs = json!({ "name": name, "outputs": exports });
        let mut state = ResourceState::new(decl.urn.clone(), name, inputs, outputs);
        if let Some(previous) = previous {
            state.created_at = previous.created_at;
        }
        Ok(state)
    }

    async fn delete_resource(&self, state: &ResourceState) -> Result<()> {
        if state.resource_type != STACK_REFERENCE_TYPE {
            self.provider_for(&state.resource_type)?.delete(state).await?;
        }
        debug!(urn = %state.urn, "Deleted resource");
        Ok(())
    }

    /// Delete every resource of a stack in reverse order and clear its exports
    #[instrument(skip(self))]
    pub async fn destroy(&self, project: &str, stack: &StackName) -> Result<OperationResult> {
        let started = Instant::now();
        let reference = self.reference(project, stack)?;
        let lock = self.store.acquire_lock(&reference).await?;

        let mut state = self
            .store
            .load(&reference)
            .await?
            .ok_or_else(|| CloudError::StackNotFound(reference.to_string()))?;

        if let Some(protected) = state.resources.iter().find(|r| r.protect) {
            return Err(CloudError::ProtectedResource(protected.urn.to_string()));
        }

        let mut operation = OperationResult::new();
        while let Some(resource) = state.resources.pop() {
            self.delete_resource(&resource).await?;
            operation.push(resource.urn.clone(), StepOp::Delete, resource.id.clone());
        }
        state.outputs.clear();
        state.updated_at = chrono::Utc::now();

        self.store.save(&reference, &state).await?;
        lock.release().await?;

        operation.duration_ms = started.elapsed().as_millis() as u64;
        info!(summary = %operation.summary(), "Stack destroyed");
        Ok(operation)
    }

    /// Exports of another stack's last deployment
    pub async fn stack_outputs(
        &self,
        reference: &StackReferenceName,
    ) -> Result<BTreeMap<String, Value>> {
        self.store
            .load(reference)
            .await?
            .map(|state| state.outputs)
            .ok_or_else(|| CloudError::StackNotFound(reference.to_string()))
    }
}
