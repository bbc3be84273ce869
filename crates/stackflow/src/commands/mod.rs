pub mod destroy;
pub mod graph;
pub mod list;
pub mod outputs;
pub mod up;
