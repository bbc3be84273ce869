use crate::stack::Urn;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("duplicate resource declaration: '{name}' is already declared as {existing}")]
    DuplicateDeclaration { name: String, existing: Urn },

    #[error("unresolved reference: '{from}' refers to {target}, which is not declared in this stack")]
    UnresolvedReference { from: String, target: Urn },

    #[error("duplicate export: {0}")]
    DuplicateExport(String),

    #[error("circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("invalid stack name '{0}': use letters, digits, '-', '_' or '.'")]
    InvalidStackName(String),

    #[error("invalid stack reference '{0}': expected <organization>/<project>/<stack>")]
    InvalidStackReference(String),

    #[error("invalid {resource_type} name '{name}': {reason}")]
    InvalidName {
        resource_type: String,
        name: String,
        reason: String,
    },

    #[error("invalid resource arguments: {0}")]
    InvalidArgs(String),

    #[error("output resolution failed: {0}")]
    Resolution(String),

    #[error("template render error: {0}")]
    TemplateRender(String),

    #[error("invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    #[error("configuration error: {0}")]
    Config(#[from] stackflow_config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, StackError>;
