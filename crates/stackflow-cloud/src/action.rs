//! Step types for deployment operations

use serde::{Deserialize, Serialize};
use stackflow_core::Urn;

/// What the engine did with one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOp {
    /// Create a new resource
    Create,
    /// Inputs changed; update in place
    Update,
    /// Inputs unchanged; prior outputs reused
    Same,
    /// No longer declared; deleted
    Delete,
}

impl std::fmt::Display for StepOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepOp::Create => write!(f, "create"),
            StepOp::Update => write!(f, "update"),
            StepOp::Same => write!(f, "same"),
            StepOp::Delete => write!(f, "delete"),
        }
    }
}

/// One applied step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub urn: Urn,
    pub op: StepOp,
    /// Provider id after the step (before it, for deletes)
    pub id: String,
}

/// Record of one `up` or `destroy`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationResult {
    /// Steps in the order they were applied
    pub steps: Vec<Step>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl OperationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, urn: Urn, op: StepOp, id: impl Into<String>) {
        self.steps.push(Step {
            urn,
            op,
            id: id.into(),
        });
    }

    /// Get steps by operation
    pub fn steps_by_op(&self, op: StepOp) -> Vec<&Step> {
        self.steps.iter().filter(|s| s.op == op).collect()
    }

    pub fn has_changes(&self) -> bool {
        self.steps.iter().any(|s| s.op != StepOp::Same)
    }

    pub fn summary(&self) -> ChangeSummary {
        ChangeSummary {
            create: self.steps_by_op(StepOp::Create).len(),
            update: self.steps_by_op(StepOp::Update).len(),
            delete: self.steps_by_op(StepOp::Delete).len(),
            same: self.steps_by_op(StepOp::Same).len(),
        }
    }
}

/// Counts per step operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub same: usize,
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} deleted, {} unchanged",
            self.create, self.update, self.delete, self.same
        )
    }
}
