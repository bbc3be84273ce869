use stackflow_core::ConfigStore;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// Write `Stackflow.<stack>.yaml`
    pub fn write_stack_config(&self, stack: &str, content: &str) {
        let path = self.root.path().join(format!("Stackflow.{}.yaml", stack));
        fs::write(path, content).unwrap();
    }

    #[allow(dead_code)]
    pub fn load_config(&self, stack: &str) -> ConfigStore {
        stackflow_config::load_stack_config(self.root.path(), stack).unwrap()
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn state_file(&self, project: &str, stack: &str) -> PathBuf {
        state_file(self.root.path(), project, stack)
    }
}

#[allow(dead_code)]
pub fn state_file(root: &Path, project: &str, stack: &str) -> PathBuf {
    root.join(".stackflow/stacks/organization")
        .join(project)
        .join(format!("{}.json", stack))
}
