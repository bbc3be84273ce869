use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration key '{0}': expected <namespace>:<key>")]
    InvalidKey(String),

    #[error("missing required configuration value '{0}'")]
    MissingRequiredKey(String),

    #[error("configuration value '{key}' is not a valid {expected}: {value}")]
    InvalidValue {
        key: String,
        expected: &'static str,
        value: String,
    },

    #[error("failed to parse stack configuration: {path}\nreason: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
