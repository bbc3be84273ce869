//! AWS resources for stackflow
//!
//! Typed arguments and handles for the AWS resource types stackflow
//! programs declare, plus [`AwsSimulator`], a [`ResourceProvider`] that
//! fabricates AWS outputs locally.
//!
//! # Example
//!
//! ```ignore
//! use stackflow_cloud_aws::dynamodb::{AttributeType, Table, TableArgs, TableAttribute};
//!
//! let table = Table::new(ctx, "items", TableArgs {
//!     attributes: vec![TableAttribute::new("id", AttributeType::String)],
//!     hash_key: "id".into(),
//!     ..Default::default()
//! }, ResourceOptions::default())?;
//! ctx.export("table_name", table.name())?;
//! ```
//!
//! [`ResourceProvider`]: stackflow_cloud::ResourceProvider

pub mod apigateway;
pub mod cloudwatch;
pub mod dynamodb;
pub mod iam;
pub mod lambda;
pub mod simulator;

pub use simulator::AwsSimulator;

use stackflow_core::Config;

/// Package prefix of AWS type tokens
pub const PACKAGE: &str = "aws";

/// Region used when `aws:region` is not configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// The configured `aws:region`
pub fn region(config: &Config) -> String {
    config.get_or("region", DEFAULT_REGION)
}
