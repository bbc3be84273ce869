//! Deployment error types

use stackflow_core::StackError;
use thiserror::Error;

/// Deployment errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("No provider registered for package '{0}'")]
    ProviderNotFound(String),

    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Provider error for {resource}: {message}")]
    ProviderError { resource: String, message: String },

    #[error("Resource {0} is protected and cannot be deleted")]
    ProtectedResource(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn provider(resource: impl ToString, message: impl Into<String>) -> Self {
        Self::ProviderError {
            resource: resource.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
