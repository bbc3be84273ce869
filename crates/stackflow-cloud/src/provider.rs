//! Resource provider trait definition

use crate::error::{CloudError, Result};
use crate::state::ResourceState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stackflow_core::Urn;

/// Resource provider abstraction trait
///
/// One provider owns every resource type of a package (`aws`,
/// `azure-native`, `gcp`). The engine hands it fully resolved inputs and
/// records whatever outputs it returns.
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Package prefix of the type tokens this provider owns
    fn package(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Create a resource and return its id and outputs
    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionResponse>;

    /// Update a resource in place; keeps the id by default
    async fn update(
        &self,
        prior: &ResourceState,
        request: &ProvisionRequest,
    ) -> Result<ProvisionResponse> {
        let mut response = self.create(request).await?;
        response.id = prior.id.clone();
        Ok(response)
    }

    /// Delete a previously created resource
    async fn delete(&self, state: &ResourceState) -> Result<()>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    /// Whether authentication is valid
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Fully resolved inputs of one declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub urn: Urn,

    /// Type token, e.g. `gcp:container:Cluster`
    pub resource_type: String,

    /// Resolved property bag (a JSON object)
    pub inputs: Value,
}

impl ProvisionRequest {
    pub fn name(&self) -> &str {
        self.urn.name()
    }

    pub fn stack(&self) -> &str {
        self.urn.stack()
    }

    /// Get an input value as a specific type
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inputs
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }

    /// A string input that must be present
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key).ok_or_else(|| {
            CloudError::provider(&self.urn, format!("missing required input '{}'", key))
        })
    }
}

/// Provider answer to a create/update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResponse {
    /// Provider-assigned id
    pub id: String,

    /// Computed outputs; merged over the inputs by the engine
    pub outputs: Map<String, Value>,
}

impl ProvisionResponse {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            outputs: Map::new(),
        }
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(key.into(), value.into());
        self
    }
}
