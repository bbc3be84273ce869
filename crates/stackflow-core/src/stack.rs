//! Stack identities
//!
//! A stack is a named deployment instance of a program (`dev`, `production`).
//! Its name is embedded verbatim in generated resource names and in the
//! URNs that identify declarations.

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const URN_PREFIX: &str = "urn:stackflow:";

/// Segments start with a letter or digit, so `.` and `..` never name a stack
fn is_valid_segment(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Validated stack name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_valid_segment(&name) {
            Ok(Self(name))
        } else {
            Err(StackError::InvalidStackName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StackName {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for StackName {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<StackName> for String {
    fn from(name: StackName) -> Self {
        name.0
    }
}

impl AsRef<str> for StackName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fully qualified name of another stack: `organization/project/stack`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackReferenceName {
    pub organization: String,
    pub project: String,
    pub stack: StackName,
}

impl StackReferenceName {
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        stack: StackName,
    ) -> Result<Self> {
        let organization = organization.into();
        let project = project.into();
        if !is_valid_segment(&organization) || !is_valid_segment(&project) {
            return Err(StackError::InvalidStackReference(format!(
                "{}/{}/{}",
                organization, project, stack
            )));
        }
        Ok(Self {
            organization,
            project,
            stack,
        })
    }
}

impl fmt::Display for StackReferenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.project, self.stack)
    }
}

impl FromStr for StackReferenceName {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [organization, project, stack] = parts.as_slice() else {
            return Err(StackError::InvalidStackReference(s.to_string()));
        };
        let stack =
            StackName::new(*stack).map_err(|_| StackError::InvalidStackReference(s.to_string()))?;
        Self::new(*organization, *project, stack)
            .map_err(|_| StackError::InvalidStackReference(s.to_string()))
    }
}

impl TryFrom<String> for StackReferenceName {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<StackReferenceName> for String {
    fn from(name: StackReferenceName) -> Self {
        name.to_string()
    }
}

/// Identity of a declaration: `urn:stackflow:<stack>::<project>::<type>::<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn {
    stack: String,
    project: String,
    resource_type: String,
    name: String,
}

impl Urn {
    pub fn new(
        stack: &StackName,
        project: &str,
        resource_type: &str,
        name: &str,
    ) -> Self {
        Self {
            stack: stack.to_string(),
            project: project.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        }
    }

    pub fn stack(&self) -> &str {
        &self.stack
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Logical name of the declaration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package that owns the resource type (`aws`, `gcp`, `azure-native`)
    pub fn package(&self) -> &str {
        self.resource_type
            .split(':')
            .next()
            .unwrap_or(&self.resource_type)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}::{}::{}::{}",
            URN_PREFIX, self.stack, self.project, self.resource_type, self.name
        )
    }
}

impl FromStr for Urn {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StackError::InvalidArgs(format!("malformed URN: {}", s));
        let rest = s.strip_prefix(URN_PREFIX).ok_or_else(invalid)?;
        let parts: Vec<&str> = rest.splitn(4, "::").collect();
        let [stack, project, resource_type, name] = parts.as_slice() else {
            return Err(invalid());
        };
        if [stack, project, resource_type, name].iter().any(|p| p.is_empty()) {
            return Err(invalid());
        }
        Ok(Self {
            stack: stack.to_string(),
            project: project.to_string(),
            resource_type: resource_type.to_string(),
            name: name.to_string(),
        })
    }
}

impl TryFrom<String> for Urn {
    type Error = StackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_name_validation() {
        assert!(StackName::new("dev").is_ok());
        assert!(StackName::new("production").is_ok());
        assert!(StackName::new("feature_x.1-a").is_ok());
        assert!(StackName::new("").is_err());
        assert!(StackName::new("dev stack").is_err());
        assert!(StackName::new("org/dev").is_err());
    }

    #[test]
    fn test_parse_stack_reference() {
        let reference: StackReferenceName = "acme/network/production".parse().unwrap();
        assert_eq!(reference.organization, "acme");
        assert_eq!(reference.project, "network");
        assert_eq!(reference.stack.as_str(), "production");
        assert_eq!(reference.to_string(), "acme/network/production");
    }

    #[test]
    fn test_parse_stack_reference_rejects_partial_names() {
        assert!("network/production".parse::<StackReferenceName>().is_err());
        assert!("production".parse::<StackReferenceName>().is_err());
        assert!("a/b/c/d".parse::<StackReferenceName>().is_err());
        assert!("acme//dev".parse::<StackReferenceName>().is_err());
    }

    #[test]
    fn test_relative_path_segments_are_rejected() {
        assert!(StackName::new(".").is_err());
        assert!(StackName::new("..").is_err());
        assert!(StackName::new(".hidden").is_err());
        assert!(StackName::new("dev.").is_ok());
        assert!("../../dev".parse::<StackReferenceName>().is_err());
        assert!("acme/../dev".parse::<StackReferenceName>().is_err());
        assert!("./network/dev".parse::<StackReferenceName>().is_err());
    }

    #[test]
    fn test_urn_display_and_parse() {
        let stack = StackName::new("dev").unwrap();
        let urn = Urn::new(&stack, "aks-cluster", "azure-native:resources:ResourceGroup", "rg");
        let text = urn.to_string();
        assert_eq!(
            text,
            "urn:stackflow:dev::aks-cluster::azure-native:resources:ResourceGroup::rg"
        );

        let parsed: Urn = text.parse().unwrap();
        assert_eq!(parsed, urn);
        assert_eq!(parsed.package(), "azure-native");
        assert_eq!(parsed.name(), "rg");
    }

    #[test]
    fn test_urn_serde_as_string() {
        let stack = StackName::new("dev").unwrap();
        let urn = Urn::new(&stack, "p", "aws:s3:Bucket", "b");
        let json = serde_json::to_string(&urn).unwrap();
        assert_eq!(json, "\"urn:stackflow:dev::p::aws:s3:Bucket::b\"");
        let back: Urn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, urn);
    }
}
