//! Stackflow Core
//!
//! Declarative resource graphs: programs declare resources with typed
//! arguments, receive handles whose outputs are deferred values, and
//! register named exports. The result of a program run is an immutable
//! [`ResourceGraph`] that an engine materializes in dependency order.
//!
//! ```text
//! Program::run ──► ProgramContext ──► ResourceGraph ──► engine
//!                    │  register()          │
//!                    │  export()            └─ dependency_order()
//!                    └─ config()
//! ```

pub mod context;
pub mod error;
pub mod graph;
pub mod kubeconfig;
pub mod naming;
pub mod output;
pub mod property;
pub mod resource;
pub mod stack;
pub mod stack_reference;

pub use context::{Program, ProgramContext, run_program};
pub use error::{Result, StackError};
pub use graph::ResourceGraph;
pub use kubeconfig::{ClusterAccess, ExecConfig, Kubeconfig, render_kubeconfig};
pub use naming::{MANAGED_BY, NameRule, Tags, stack_scoped};
pub use output::{Output, OutputExpr, ResolvedOutputs};
pub use property::{PropertyMap, PropertyValue};
pub use resource::{Resource, ResourceArgs, ResourceDeclaration, ResourceHandle, ResourceOptions};
pub use stack::{StackName, StackReferenceName, Urn};
pub use stack_reference::{STACK_REFERENCE_TYPE, StackReference};

pub use stackflow_config::{Config, ConfigError, ConfigStore};
