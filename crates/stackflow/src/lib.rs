//! Stackflow
//!
//! Bundled infrastructure programs and the wiring that runs them against
//! the local simulation backend.

pub mod programs;

use stackflow_cloud::LocalEngine;
use stackflow_cloud_aws::AwsSimulator;
use stackflow_cloud_azure::AzureSimulator;
use stackflow_cloud_gcp::GcpSimulator;
use stackflow_core::{Config, ConfigStore};
use std::path::Path;
use std::sync::Arc;

/// Engine rooted at `project_root` with a simulator for every supported cloud
pub fn local_engine(project_root: &Path, config: &ConfigStore) -> LocalEngine {
    let store = Arc::new(config.clone());
    let aws = Config::new(store.clone(), stackflow_cloud_aws::PACKAGE);
    let gcp = Config::new(store, stackflow_cloud_gcp::PACKAGE);

    LocalEngine::new(project_root)
        .with_provider(Arc::new(AwsSimulator::from_config(&aws)))
        .with_provider(Arc::new(AzureSimulator::default()))
        .with_provider(Arc::new(GcpSimulator::from_config(&gcp)))
}
