//! Google Cloud resources for stackflow
//!
//! Typed arguments and handles for the `gcp` resource types used by
//! stackflow programs, GKE kubeconfig rendering, and [`GcpSimulator`].

pub mod compute;
pub mod container;
pub mod kubeconfig;
pub mod simulator;
pub mod sql;

pub use kubeconfig::{gke_context_name, gke_kubeconfig};
pub use simulator::GcpSimulator;

use stackflow_core::Config;

/// Package prefix of GCP type tokens
pub const PACKAGE: &str = "gcp";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-central1";

/// `gcp:region`, falling back to [`DEFAULT_REGION`]
pub fn region(config: &Config) -> String {
    config.get_or("region", DEFAULT_REGION)
}
