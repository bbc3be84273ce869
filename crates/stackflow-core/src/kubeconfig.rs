//! Cluster-access document (kubeconfig) generation
//!
//! The document is rendered with Tera by substituting the cluster endpoint,
//! CA certificate and context name into a fixed template, then parsed back
//! into typed structs and validated so that standard tooling can consume it.

use crate::error::{Result, StackError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tera::{Context, Tera};

const KUBECONFIG_TEMPLATE: &str = r#"apiVersion: v1
clusters:
- cluster:
    certificate-authority-data: {{ certificate_authority_data | json_encode() | safe }}
    server: {{ server | json_encode() | safe }}
  name: {{ context | json_encode() | safe }}
contexts:
- context:
    cluster: {{ context | json_encode() | safe }}
    user: {{ context | json_encode() | safe }}
  name: {{ context | json_encode() | safe }}
current-context: {{ context | json_encode() | safe }}
kind: Config
preferences: {}
users:
- name: {{ context | json_encode() | safe }}
  user:
    exec:
      apiVersion: {{ exec.api_version | json_encode() | safe }}
      command: {{ exec.command | json_encode() | safe }}
{%- if exec.args %}
      args:
{%- for arg in exec.args %}
      - {{ arg | json_encode() | safe }}
{%- endfor %}
{%- endif %}
{%- if exec.install_hint %}
      installHint: {{ exec.install_hint | json_encode() | safe }}
{%- endif %}
      provideClusterInfo: {{ exec.provide_cluster_info }}
"#;

/// Client-side credential plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecConfig {
    pub api_version: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,
    #[serde(default)]
    pub provide_cluster_info: bool,
}

/// Inputs of a rendered kubeconfig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAccess {
    pub context_name: String,
    /// API server URL, e.g. `https://34.68.1.2`
    pub server: String,
    /// Base64 encoded CA bundle
    pub certificate_authority_data: String,
    pub exec: ExecConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
    pub server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

/// Typed view of a kubeconfig document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kubeconfig {
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_yaml::Value>,
    pub users: Vec<NamedUser>,
}

impl Kubeconfig {
    pub fn parse(document: &str) -> Result<Self> {
        serde_yaml::from_str(document).map_err(|e| StackError::InvalidKubeconfig(e.to_string()))
    }

    /// Structural checks for a single-cluster document
    ///
    /// Exactly one context named `context_name`, selected as the current
    /// context, pointing at a cluster and a user of the same document.
    pub fn validate(&self, context_name: &str) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(StackError::InvalidKubeconfig(msg)) };

        if self.api_version != "v1" {
            return invalid(format!("unsupported apiVersion '{}'", self.api_version));
        }
        if self.kind != "Config" {
            return invalid(format!("unexpected kind '{}'", self.kind));
        }

        let matching: Vec<&NamedContext> = self
            .contexts
            .iter()
            .filter(|c| c.name == context_name)
            .collect();
        if self.contexts.len() != 1 || matching.len() != 1 {
            return invalid(format!(
                "expected exactly one context named '{}', found {}",
                context_name,
                self.contexts.len()
            ));
        }
        if self.current_context != context_name {
            return invalid(format!(
                "current-context '{}' does not match '{}'",
                self.current_context, context_name
            ));
        }

        let context = &matching[0].context;
        let Some(cluster) = self.clusters.iter().find(|c| c.name == context.cluster) else {
            return invalid(format!("context refers to unknown cluster '{}'", context.cluster));
        };
        if !self.users.iter().any(|u| u.name == context.user) {
            return invalid(format!("context refers to unknown user '{}'", context.user));
        }
        if cluster.cluster.server.is_empty() {
            return invalid("cluster server is empty".to_string());
        }
        if cluster.cluster.certificate_authority_data.is_empty() {
            return invalid("certificate-authority-data is empty".to_string());
        }

        Ok(())
    }
}

/// Render the kubeconfig document for `access` and validate it
pub fn render_kubeconfig(access: &ClusterAccess) -> Result<String> {
    let mut context = Context::new();
    context.insert("context", &access.context_name);
    context.insert("server", &access.server);
    context.insert(
        "certificate_authority_data",
        &access.certificate_authority_data,
    );

    // ExecConfig serializes in camelCase; the template reads snake_case
    let exec = serde_json::json!({
        "api_version": access.exec.api_version,
        "command": access.exec.command,
        "args": access.exec.args,
        "install_hint": access.exec.install_hint,
        "provide_cluster_info": access.exec.provide_cluster_info,
    });
    context.insert("exec", &exec);

    let document = Tera::default()
        .render_str(KUBECONFIG_TEMPLATE, &context)
        .map_err(|e| StackError::TemplateRender(extract_tera_error_detail(&e)))?;

    Kubeconfig::parse(&document)?.validate(&access.context_name)?;
    tracing::debug!(context = %access.context_name, "Rendered kubeconfig");
    Ok(document)
}

/// Flatten a Tera error chain into one line
fn extract_tera_error_detail(e: &tera::Error) -> String {
    use std::error::Error;

    let mut details = vec![e.to_string()];
    let mut source = e.source();
    while let Some(err) = source {
        details.push(err.to_string());
        source = err.source();
    }
    details.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access() -> ClusterAccess {
        ClusterAccess {
            context_name: "my-project_us-central1_gke-dev".to_string(),
            server: "https://34.68.10.20".to_string(),
            certificate_authority_data: "LS0tLS1CRUdJTi==".to_string(),
            exec: ExecConfig {
                api_version: "client.authentication.k8s.io/v1beta1".to_string(),
                command: "gke-gcloud-auth-plugin".to_string(),
                args: Vec::new(),
                install_hint: Some("Install gke-gcloud-auth-plugin for use with kubectl".to_string()),
                provide_cluster_info: true,
            },
        }
    }

    #[test]
    fn test_render_produces_standard_fields() {
        let document = render_kubeconfig(&access()).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&document).unwrap();

        assert_eq!(value["apiVersion"].as_str(), Some("v1"));
        assert_eq!(value["kind"].as_str(), Some("Config"));
        assert_eq!(
            value["clusters"][0]["cluster"]["certificate-authority-data"].as_str(),
            Some("LS0tLS1CRUdJTi==")
        );
        assert_eq!(
            value["clusters"][0]["cluster"]["server"].as_str(),
            Some("https://34.68.10.20")
        );
        assert_eq!(
            value["current-context"].as_str(),
            Some("my-project_us-central1_gke-dev")
        );
        assert_eq!(
            value["users"][0]["user"]["exec"]["command"].as_str(),
            Some("gke-gcloud-auth-plugin")
        );
        assert_eq!(
            value["users"][0]["user"]["exec"]["provideClusterInfo"].as_bool(),
            Some(true)
        );
        assert!(value["users"][0]["user"]["exec"].get("args").is_none());
    }

    #[test]
    fn test_render_has_exactly_one_matching_context() {
        let document = render_kubeconfig(&access()).unwrap();
        let config = Kubeconfig::parse(&document).unwrap();
        assert_eq!(config.contexts.len(), 1);
        assert_eq!(config.contexts[0].name, "my-project_us-central1_gke-dev");
        assert_eq!(config.contexts[0].context.cluster, config.clusters[0].name);
        assert_eq!(config.contexts[0].context.user, config.users[0].name);
    }

    #[test]
    fn test_render_with_exec_args() {
        let mut access = access();
        access.exec.args = vec!["--use_application_default_credentials".to_string()];
        access.exec.install_hint = None;

        let config = Kubeconfig::parse(&render_kubeconfig(&access).unwrap()).unwrap();
        let exec = config.users[0].user.exec.as_ref().unwrap();
        assert_eq!(exec.args, vec!["--use_application_default_credentials"]);
        assert!(exec.install_hint.is_none());
    }

    #[test]
    fn test_special_characters_are_quoted() {
        let mut access = access();
        access.server = "https://host: with colon".to_string();
        let config = Kubeconfig::parse(&render_kubeconfig(&access).unwrap()).unwrap();
        assert_eq!(config.clusters[0].cluster.server, "https://host: with colon");
    }

    #[test]
    fn test_validate_rejects_mismatched_context() {
        let document = render_kubeconfig(&access()).unwrap();
        let config = Kubeconfig::parse(&document).unwrap();
        assert!(matches!(
            config.validate("other"),
            Err(StackError::InvalidKubeconfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_extra_context() {
        let document = render_kubeconfig(&access()).unwrap();
        let mut config = Kubeconfig::parse(&document).unwrap();
        let mut extra = config.contexts[0].clone();
        extra.name = "second".to_string();
        config.contexts.push(extra);
        assert!(config.validate("my-project_us-central1_gke-dev").is_err());
    }

    #[test]
    fn test_render_rejects_empty_certificate() {
        let mut access = access();
        access.certificate_authority_data = String::new();
        assert!(matches!(
            render_kubeconfig(&access),
            Err(StackError::InvalidKubeconfig(_))
        ));
    }
}
