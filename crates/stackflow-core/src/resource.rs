//! Resource declarations and handles

use crate::error::Result;
use crate::output::{Output, OutputExpr};
use crate::property::PropertyMap;
use crate::stack::Urn;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Typed arguments of one resource type
///
/// Provider crates implement this for each `*Args` struct. Conversion may
/// fail when a literal argument is malformed (for example a name that does
/// not match the provider's naming rules).
pub trait ResourceArgs {
    /// Type token, e.g. `aws:dynamodb:Table`
    fn resource_type(&self) -> &'static str;

    fn into_properties(self) -> Result<PropertyMap>;
}

/// Anything backed by a declaration
pub trait Resource {
    fn handle(&self) -> &ResourceHandle;

    fn urn(&self) -> &Urn {
        self.handle().urn()
    }
}

/// Declaration options
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceOptions {
    /// Explicit dependencies in addition to the ones implied by outputs
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Urn>,

    /// Refuse deletion by the engine
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protect: bool,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depends_on(mut self, resource: &dyn Resource) -> Self {
        self.depends_on.push(resource.urn().clone());
        self
    }

    pub fn protect(mut self, protect: bool) -> Self {
        self.protect = protect;
        self
    }
}

/// One (type, logical-name, property-bag) entry of a stack
#[derive(Debug, Clone, Serialize)]
pub struct ResourceDeclaration {
    pub urn: Urn,
    pub name: String,
    pub resource_type: String,
    pub properties: PropertyMap,
    /// Implicit (from outputs) and explicit dependencies
    pub dependencies: BTreeSet<Urn>,
    #[serde(skip_serializing_if = "is_default_options")]
    pub options: ResourceOptions,
}

fn is_default_options(options: &ResourceOptions) -> bool {
    options.depends_on.is_empty() && !options.protect
}

/// Opaque handle to a declared resource
///
/// Every field of the eventual provider outputs is reachable as a deferred
/// value; nothing is known until an engine materializes the resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    urn: Urn,
}

impl ResourceHandle {
    pub(crate) fn new(urn: Urn) -> Self {
        Self { urn }
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn name(&self) -> &str {
        self.urn.name()
    }

    pub fn resource_type(&self) -> &str {
        self.urn.resource_type()
    }

    /// Provider-assigned id
    pub fn id(&self) -> Output<String> {
        self.output("id")
    }

    /// A top-level output field
    pub fn output<T>(&self, field: &str) -> Output<T> {
        self.output_path(&[field])
    }

    /// A nested output field
    pub fn output_path<T>(&self, path: &[&str]) -> Output<T> {
        Output::from_expr(OutputExpr::property(self.urn.clone(), path.iter().copied()))
    }

    /// All outputs as one value
    pub fn outputs(&self) -> Output<Value> {
        Output::from_expr(OutputExpr::property(self.urn.clone(), Vec::<String>::new()))
    }
}

impl Resource for ResourceHandle {
    fn handle(&self) -> &ResourceHandle {
        self
    }
}
