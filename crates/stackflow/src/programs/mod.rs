//! Bundled infrastructure programs

pub mod aks_cluster;
pub mod gke_cluster;
pub mod serverless_api;

use stackflow_core::Program;

pub use aks_cluster::AksCluster;
pub use gke_cluster::GkeCluster;
pub use serverless_api::ServerlessApi;

/// Every bundled program, sorted by name
pub fn all() -> Vec<Box<dyn Program>> {
    vec![
        Box::new(AksCluster),
        Box::new(GkeCluster),
        Box::new(ServerlessApi),
    ]
}

/// Look up a bundled program by name
pub fn find(name: &str) -> Option<Box<dyn Program>> {
    all().into_iter().find(|p| p.name() == name)
}
