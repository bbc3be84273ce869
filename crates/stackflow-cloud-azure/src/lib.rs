//! Azure resources for stackflow
//!
//! Typed arguments and handles for the `azure-native` resource types used by
//! stackflow programs, Azure naming rules, and [`AzureSimulator`].
//!
//! # Example
//!
//! ```ignore
//! use stackflow_cloud_azure::resources::{ResourceGroup, ResourceGroupArgs};
//!
//! let rg = ResourceGroup::new(ctx, "rg", ResourceGroupArgs {
//!     resource_group_name: stack_scoped("rg-aks", ctx.stack()).into(),
//!     location: "eastus".into(),
//!     tags: Tags::standard(ctx.stack()),
//! }, ResourceOptions::default())?;
//! ```

pub mod containerservice;
pub mod documentdb;
pub mod keyvault;
pub mod naming;
pub mod resources;
pub mod simulator;

pub use simulator::AzureSimulator;

/// Package prefix of Azure type tokens
pub const PACKAGE: &str = "azure-native";

/// Location used when none is configured
pub const DEFAULT_LOCATION: &str = "eastus";
