pub mod error;
pub mod store;

pub use error::*;
pub use store::{Config, ConfigStore};

use std::path::{Path, PathBuf};

/// Environment variable that forces the stack configuration file
pub const CONFIG_PATH_ENV: &str = "STACKFLOW_CONFIG_PATH";

/// Directory holding project-local stackflow files
pub const PROJECT_DIR: &str = ".stackflow";

/// Find the configuration file of `stack` inside `project_dir`
///
/// Search order:
/// 1. `STACKFLOW_CONFIG_PATH` (direct path)
/// 2. `Stackflow.<stack>.yaml`, `Stackflow.<stack>.yml` in the project directory
/// 3. `.stackflow/<stack>.yaml`, `.stackflow/<stack>.yml`
///
/// A stack without a configuration file is valid, so `Ok(None)` is returned
/// when nothing matches.
pub fn find_stack_config(project_dir: &Path, stack: &str) -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(
            path = %path.display(),
            "{} points to a missing file, falling back to discovery",
            CONFIG_PATH_ENV
        );
    }

    let candidates = [
        format!("Stackflow.{}.yaml", stack),
        format!("Stackflow.{}.yml", stack),
    ];
    for filename in &candidates {
        let path = project_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    let dir = project_dir.join(PROJECT_DIR);
    if dir.is_dir() {
        for filename in [format!("{}.yaml", stack), format!("{}.yml", stack)] {
            let path = dir.join(filename);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    Ok(None)
}

/// Load the configuration of `stack`, or an empty store if it has none
pub fn load_stack_config(project_dir: &Path, stack: &str) -> Result<ConfigStore> {
    match find_stack_config(project_dir, stack)? {
        Some(path) => ConfigStore::load(&path),
        None => {
            tracing::debug!(stack, "No stack configuration found, using empty config");
            Ok(ConfigStore::new())
        }
    }
}
