//! Read-only references to other stacks' exports

use crate::context::ProgramContext;
use crate::error::Result;
use crate::output::Output;
use crate::property::PropertyMap;
use crate::resource::{Resource, ResourceHandle, ResourceOptions};
use crate::stack::StackReferenceName;
use serde_json::Value;

/// Type token of stack reference declarations; resolved by the engine itself
pub const STACK_REFERENCE_TYPE: &str = "stackflow:index:StackReference";

/// Handle to another stack's exports
///
/// The referenced values are deferred: the engine fills them in from the
/// referenced stack's last deployment.
#[derive(Debug, Clone)]
pub struct StackReference {
    handle: ResourceHandle,
    reference: StackReferenceName,
}

impl StackReference {
    /// Reference `organization/project/stack`
    pub fn new(ctx: &mut ProgramContext, name: &str) -> Result<Self> {
        let reference: StackReferenceName = name.parse()?;
        let properties = PropertyMap::new().with("name", reference.to_string());
        let handle = ctx.register_properties(
            name,
            STACK_REFERENCE_TYPE,
            properties,
            ResourceOptions::default(),
        )?;
        Ok(Self { handle, reference })
    }

    pub fn reference(&self) -> &StackReferenceName {
        &self.reference
    }

    /// An exported value; resolves to `null` when the stack does not export it
    pub fn get_output(&self, name: &str) -> Output<Value> {
        self.handle.output_path(&["outputs", name])
    }

    /// An exported value that must exist
    pub fn require_output(&self, name: &str) -> Output<Value> {
        let export = name.to_string();
        let stack = self.reference.to_string();
        self.get_output(name).try_apply(move |value: Value| {
            if value.is_null() {
                Err(format!(
                    "required output '{}' does not exist on stack {}",
                    export, stack
                ))
            } else {
                Ok(value)
            }
        })
    }
}

impl Resource for StackReference {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
