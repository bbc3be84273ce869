//! State management for deployed stacks
//!
//! Each stack is tracked in
//! `.stackflow/stacks/<organization>/<project>/<stack>.json`, next to a
//! backup of the previous state and a lock file.

use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackflow_core::{StackName, StackReferenceName, Urn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const STATE_VERSION: u32 = 1;
const STATE_DIR: &str = ".stackflow";
const STACKS_DIR: &str = "stacks";
const STALE_LOCK_HOURS: i64 = 1;

/// Last deployed state of one stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackState {
    /// State file version
    pub version: u32,

    pub project: String,

    pub stack: StackName,

    /// Last modified timestamp
    pub updated_at: DateTime<Utc>,

    /// Resources in the order they were applied
    pub resources: Vec<ResourceState>,

    /// Resolved exports
    pub outputs: BTreeMap<String, Value>,
}

impl StackState {
    pub fn new(project: impl Into<String>, stack: StackName) -> Self {
        Self {
            version: STATE_VERSION,
            project: project.into(),
            stack,
            updated_at: Utc::now(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Get a resource by urn
    pub fn get_resource(&self, urn: &Urn) -> Option<&ResourceState> {
        self.resources.iter().find(|r| &r.urn == urn)
    }

    /// Add or update a resource
    pub fn set_resource(&mut self, state: ResourceState) {
        match self.resources.iter_mut().find(|r| r.urn == state.urn) {
            Some(existing) => *existing = state,
            None => self.resources.push(state),
        }
        self.updated_at = Utc::now();
    }

    /// Remove a resource
    pub fn remove_resource(&mut self, urn: &Urn) -> Option<ResourceState> {
        let index = self.resources.iter().position(|r| &r.urn == urn)?;
        self.updated_at = Utc::now();
        Some(self.resources.remove(index))
    }
}

/// State of a single resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceState {
    pub urn: Urn,

    /// Provider-specific resource ID
    pub id: String,

    /// Resource type
    pub resource_type: String,

    /// Resolved inputs the resource was last applied with
    pub inputs: Value,

    /// Inputs merged with provider-computed outputs
    pub outputs: Value,

    #[serde(default)]
    pub dependencies: Vec<Urn>,

    #[serde(default)]
    pub protect: bool,

    /// When the resource was created
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ResourceState {
    pub fn new(urn: Urn, id: impl Into<String>, inputs: Value, outputs: Value) -> Self {
        let now = Utc::now();
        Self {
            resource_type: urn.resource_type().to_string(),
            urn,
            id: id.into(),
            inputs,
            outputs,
            dependencies: Vec::new(),
            protect: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get an output value as a specific type
    pub fn get_output<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.outputs
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Reads and writes stack state files
#[derive(Debug, Clone)]
pub struct StackStore {
    /// Project root directory
    project_root: PathBuf,
}

impl StackStore {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    fn stack_dir(&self, stack: &StackReferenceName) -> PathBuf {
        self.project_root
            .join(STATE_DIR)
            .join(STACKS_DIR)
            .join(&stack.organization)
            .join(&stack.project)
    }

    /// Get the state file path
    pub fn state_path(&self, stack: &StackReferenceName) -> PathBuf {
        self.stack_dir(stack).join(format!("{}.json", stack.stack))
    }

    fn backup_path(&self, stack: &StackReferenceName) -> PathBuf {
        self.stack_dir(stack)
            .join(format!("{}.json.backup", stack.stack))
    }

    fn lock_path(&self, stack: &StackReferenceName) -> PathBuf {
        self.stack_dir(stack).join(format!("{}.lock.json", stack.stack))
    }

    async fn ensure_stack_dir(&self, stack: &StackReferenceName) -> Result<()> {
        let dir = self.stack_dir(stack);
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created state directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the state of `stack`; `None` if it was never deployed
    #[tracing::instrument(skip(self, stack), fields(stack = %stack))]
    pub async fn load(&self, stack: &StackReferenceName) -> Result<Option<StackState>> {
        let path = self.state_path(stack);
        if !path.exists() {
            tracing::debug!("State file not found");
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let state: StackState = serde_json::from_str(&content)?;

        if state.version > STATE_VERSION {
            return Err(CloudError::StateError(format!(
                "State file version {} is newer than supported version {}",
                state.version, STATE_VERSION
            )));
        }

        tracing::debug!("Loaded state with {} resources", state.resources.len());
        Ok(Some(state))
    }

    /// Save the state, keeping the previous file as a backup
    #[tracing::instrument(skip(self, stack, state), fields(stack = %stack))]
    pub async fn save(&self, stack: &StackReferenceName, state: &StackState) -> Result<()> {
        self.ensure_stack_dir(stack).await?;

        let path = self.state_path(stack);
        let backup = self.backup_path(stack);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created state backup");
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&path, content).await?;

        tracing::debug!("Saved state with {} resources", state.resources.len());
        Ok(())
    }

    /// Acquire a lock for exclusive access to one stack
    pub async fn acquire_lock(&self, stack: &StackReferenceName) -> Result<StackLock> {
        self.ensure_stack_dir(stack).await?;

        let lock_path = self.lock_path(stack);

        if lock_path.exists() {
            let content = fs::read_to_string(&lock_path).await?;
            let lock_info: LockInfo = serde_json::from_str(&content)?;

            let age = Utc::now().signed_duration_since(lock_info.acquired_at);
            if age.num_hours() < STALE_LOCK_HOURS {
                return Err(CloudError::LockError(format!(
                    "Stack {} is locked by {} since {}",
                    stack, lock_info.holder, lock_info.acquired_at
                )));
            }

            tracing::warn!("Removing stale lock from {}", lock_info.holder);
        }

        let lock_info = LockInfo {
            holder: std::env::var("HOSTNAME")
                .or_else(|_| std::env::var("HOST"))
                .unwrap_or_else(|_| "unknown".to_string()),
            acquired_at: Utc::now(),
        };

        let content = serde_json::to_string_pretty(&lock_info)?;
        fs::write(&lock_path, content).await?;

        tracing::debug!(stack = %stack, "Acquired state lock");
        Ok(StackLock {
            lock_path,
            released: false,
        })
    }
}

/// Lock information
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    holder: String,
    acquired_at: DateTime<Utc>,
}

/// RAII guard for a stack lock
#[derive(Debug)]
pub struct StackLock {
    lock_path: PathBuf,
    released: bool,
}

impl StackLock {
    /// Release the lock
    pub async fn release(mut self) -> Result<()> {
        if !self.released {
            if self.lock_path.exists() {
                fs::remove_file(&self.lock_path).await?;
                tracing::debug!("Released state lock");
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for StackLock {
    fn drop(&mut self) {
        if !self.released && self.lock_path.exists() {
            let _ = std::fs::remove_file(&self.lock_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn reference() -> StackReferenceName {
        "organization/app/dev".parse().unwrap()
    }

    fn urn(name: &str) -> Urn {
        Urn::new(&StackName::new("dev").unwrap(), "app", "aws:s3:Bucket", name)
    }

    #[tokio::test]
    async fn test_state_save_load() {
        let temp_dir = tempdir().unwrap();
        let store = StackStore::new(temp_dir.path());

        let mut state = StackState::new("app", StackName::new("dev").unwrap());
        state.set_resource(ResourceState::new(
            urn("assets"),
            "assets-1234",
            json!({ "bucket": "assets-dev" }),
            json!({ "bucket": "assets-dev", "arn": "arn:aws:s3:::assets-dev" }),
        ));
        state.outputs.insert("bucket".into(), json!("assets-dev"));

        store.save(&reference(), &state).await.unwrap();
        assert!(
            temp_dir
                .path()
                .join(".stackflow/stacks/organization/app/dev.json")
                .exists()
        );

        let loaded = store.load(&reference()).await.unwrap().unwrap();
        assert_eq!(loaded.resources.len(), 1);
        assert_eq!(loaded.outputs["bucket"], json!("assets-dev"));
        let bucket = loaded.get_resource(&urn("assets")).unwrap();
        assert_eq!(
            bucket.get_output::<String>("arn").as_deref(),
            Some("arn:aws:s3:::assets-dev")
        );
    }

    #[tokio::test]
    async fn test_missing_state() {
        let temp_dir = tempdir().unwrap();
        let store = StackStore::new(temp_dir.path());
        assert!(store.load(&reference()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_backup() {
        let temp_dir = tempdir().unwrap();
        let store = StackStore::new(temp_dir.path());
        let state = StackState::new("app", StackName::new("dev").unwrap());

        store.save(&reference(), &state).await.unwrap();
        store.save(&reference(), &state).await.unwrap();
        assert!(
            temp_dir
                .path()
                .join(".stackflow/stacks/organization/app/dev.json.backup")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_lock_is_exclusive() {
        let temp_dir = tempdir().unwrap();
        let store = StackStore::new(temp_dir.path());

        let lock = store.acquire_lock(&reference()).await.unwrap();
        assert!(matches!(
            store.acquire_lock(&reference()).await,
            Err(CloudError::LockError(_))
        ));

        lock.release().await.unwrap();
        let again = store.acquire_lock(&reference()).await.unwrap();
        drop(again);
        assert!(store.acquire_lock(&reference()).await.is_ok());
    }

    #[tokio::test]
    async fn test_stale_lock_is_taken_over() {
        let temp_dir = tempdir().unwrap();
        let store = StackStore::new(temp_dir.path());
        store.ensure_stack_dir(&reference()).await.unwrap();

        let stale = LockInfo {
            holder: "old-host".into(),
            acquired_at: Utc::now() - chrono::Duration::hours(2),
        };
        std::fs::write(
            store.lock_path(&reference()),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(store.acquire_lock(&reference()).await.is_ok());
    }

    #[test]
    fn test_remove_resource() {
        let mut state = StackState::new("app", StackName::new("dev").unwrap());
        state.set_resource(ResourceState::new(urn("a"), "a-1", json!({}), json!({})));
        state.set_resource(ResourceState::new(urn("a"), "a-2", json!({}), json!({})));
        assert_eq!(state.resources.len(), 1);
        assert_eq!(state.resources[0].id, "a-2");

        assert!(state.remove_resource(&urn("a")).is_some());
        assert!(state.remove_resource(&urn("a")).is_none());
    }
}
