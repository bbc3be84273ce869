//! Stackflow Cloud
//!
//! Provider abstraction and the local deployment engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 stackflow CLI                    │
//! │             (stackflow up/destroy)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ResourceGraph
//! ┌─────────────────▼───────────────────────────────┐
//! │                stackflow-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  LocalEngine (dependency-ordered apply)  │   │
//! │  │  trait ResourceProvider { ... }          │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  StackStore (state, backup, lock)        │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────┬───────────────┬───────┘
//!         │                 │               │
//! ┌───────▼──────┐ ┌────────▼─────┐ ┌───────▼──────┐
//! │     aws      │ │ azure-native │ │     gcp      │
//! │  simulator   │ │  simulator   │ │  simulator   │
//! └──────────────┘ └──────────────┘ └──────────────┘
//! ```

pub mod action;
pub mod engine;
pub mod error;
pub mod provider;
pub mod simulate;
pub mod state;

// Re-exports
pub use action::{ChangeSummary, OperationResult, Step, StepOp};
pub use engine::{DEFAULT_ORGANIZATION, LocalEngine, UpResult};
pub use error::{CloudError, Result};
pub use provider::{AuthStatus, ProvisionRequest, ProvisionResponse, ResourceProvider};
pub use state::{ResourceState, StackLock, StackState, StackStore};
