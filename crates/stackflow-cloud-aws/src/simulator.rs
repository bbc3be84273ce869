//! Local AWS simulator
//!
//! Fabricates the outputs AWS would compute (ARNs, generated names, API
//! URLs) without calling any AWS API.

use crate::{DEFAULT_REGION, PACKAGE, apigateway, cloudwatch, dynamodb, iam, lambda};
use async_trait::async_trait;
use serde_json::json;
use stackflow_cloud::simulate::{physical_name, stable_hex};
use stackflow_cloud::{
    AuthStatus, CloudError, ProvisionRequest, ProvisionResponse, ResourceProvider, ResourceState,
    Result,
};
use stackflow_core::Config;

/// Account id reported by the simulator
pub const SIMULATED_ACCOUNT_ID: &str = "123456789012";

pub struct AwsSimulator {
    region: String,
    account_id: String,
}

impl AwsSimulator {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: SIMULATED_ACCOUNT_ID.to_string(),
        }
    }

    /// Reads `aws:region`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_or("region", DEFAULT_REGION))
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn arn(&self, service: &str, resource: &str) -> String {
        format!(
            "arn:aws:{}:{}:{}:{}",
            service, self.region, self.account_id, resource
        )
    }

    fn table(&self, request: &ProvisionRequest) -> ProvisionResponse {
        let name = physical_name(request, "name");
        ProvisionResponse::new(&name)
            .with_output("arn", self.arn("dynamodb", &format!("table/{}", name)))
            .with_output("name", name)
    }

    fn role(&self, request: &ProvisionRequest) -> ProvisionResponse {
        let name = physical_name(request, "name");
        ProvisionResponse::new(&name)
            .with_output(
                "arn",
                format!("arn:aws:iam::{}:role/{}", self.account_id, name),
            )
            .with_output("uniqueId", format!("AROA{}", stable_hex(&name, 16).to_uppercase()))
            .with_output("name", name)
    }

    fn role_policy_attachment(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let role = request.require_str("role")?;
        Ok(ProvisionResponse::new(format!(
            "{}-{}",
            role,
            stable_hex(&request.urn.to_string(), 8)
        )))
    }

    fn role_policy(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let role = request.require_str("role")?;
        let policy = request.require_str("policy")?;
        serde_json::from_str::<iam::PolicyDocument>(policy).map_err(|e| {
            CloudError::provider(&request.urn, format!("malformed policy document: {}", e))
        })?;
        let name = physical_name(request, "name");
        Ok(ProvisionResponse::new(format!("{}:{}", role, name)).with_output("name", name))
    }

    fn function(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        request.require_str("role")?;
        let name = physical_name(request, "name");
        let arn = self.arn("lambda", &format!("function:{}", name));
        let invoke_arn = format!(
            "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
            self.region, arn
        );
        Ok(ProvisionResponse::new(&name)
            .with_output("arn", arn)
            .with_output("invokeArn", invoke_arn)
            .with_output("version", "$LATEST")
            .with_output("name", name))
    }

    fn log_group(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let name = request.require_str("name")?.to_string();
        Ok(ProvisionResponse::new(&name)
            .with_output("arn", self.arn("logs", &format!("log-group:{}", name))))
    }

    fn rest_api(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let stage = request.require_str("stageName")?;
        let id = stable_hex(&request.urn.to_string(), 10);
        let url = format!(
            "https://{}.execute-api.{}.amazonaws.com/{}/",
            id, self.region, stage
        );
        let routes = request.inputs.get("routes").cloned().unwrap_or(json!([]));
        Ok(ProvisionResponse::new(&id)
            .with_output("url", url)
            .with_output("routes", routes))
    }
}

#[async_trait]
impl ResourceProvider for AwsSimulator {
    fn package(&self) -> &str {
        PACKAGE
    }

    fn display_name(&self) -> &str {
        "AWS (simulated)"
    }

    async fn check_auth(&self) -> Result<AuthStatus> {
        Ok(AuthStatus::ok(format!(
            "{} ({})",
            self.account_id, self.region
        )))
    }

    async fn create(&self, request: &ProvisionRequest) -> Result<ProvisionResponse> {
        let response = match request.resource_type.as_str() {
            dynamodb::TABLE => self.table(request),
            iam::ROLE => self.role(request),
            iam::ROLE_POLICY_ATTACHMENT => self.role_policy_attachment(request)?,
            iam::ROLE_POLICY => self.role_policy(request)?,
            lambda::FUNCTION => self.function(request)?,
            cloudwatch::LOG_GROUP => self.log_group(request)?,
            apigateway::REST_API => self.rest_api(request)?,
            other => {
                return Err(CloudError::provider(
                    &request.urn,
                    format!("unsupported resource type {}", other),
                ));
            }
        };
        tracing::debug!(urn = %request.urn, id = %response.id, "Simulated AWS resource");
        Ok(response)
    }

    async fn delete(&self, state: &ResourceState) -> Result<()> {
        tracing::debug!(urn = %state.urn, id = %state.id, "Simulated AWS delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use stackflow_core::{StackName, Urn};

    fn request(resource_type: &str, name: &str, inputs: Value) -> ProvisionRequest {
        ProvisionRequest {
            urn: Urn::new(&StackName::new("dev").unwrap(), "app", resource_type, name),
            resource_type: resource_type.to_string(),
            inputs,
        }
    }

    #[tokio::test]
    async fn test_table_arn() {
        let sim = AwsSimulator::new("eu-west-1");
        let response = sim
            .create(&request(dynamodb::TABLE, "items", json!({ "name": "items-dev" })))
            .await
            .unwrap();
        assert_eq!(response.id, "items-dev");
        assert_eq!(
            response.outputs["arn"],
            json!("arn:aws:dynamodb:eu-west-1:123456789012:table/items-dev")
        );
    }

    #[tokio::test]
    async fn test_function_invoke_arn() {
        let sim = AwsSimulator::new("us-east-1");
        let response = sim
            .create(&request(
                lambda::FUNCTION,
                "handler",
                json!({ "name": "api-dev-handler", "role": "arn:aws:iam::1:role/r" }),
            ))
            .await
            .unwrap();
        let invoke = response.outputs["invokeArn"].as_str().unwrap();
        assert!(invoke.contains("function:api-dev-handler/invocations"));
    }

    #[tokio::test]
    async fn test_rest_api_url_uses_stage() {
        let sim = AwsSimulator::new("us-east-1");
        let response = sim
            .create(&request(apigateway::REST_API, "api", json!({ "stageName": "dev" })))
            .await
            .unwrap();
        let url = response.outputs["url"].as_str().unwrap();
        assert!(url.starts_with("https://"));
        assert!(url.ends_with(".execute-api.us-east-1.amazonaws.com/dev/"));
    }

    #[tokio::test]
    async fn test_malformed_policy_rejected() {
        let sim = AwsSimulator::new("us-east-1");
        let err = sim
            .create(&request(
                iam::ROLE_POLICY,
                "policy",
                json!({ "role": "r", "policy": "not json" }),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::ProviderError { .. }));
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let sim = AwsSimulator::new("us-east-1");
        assert!(
            sim.create(&request("aws:s3:Bucket", "b", json!({})))
                .await
                .is_err()
        );
    }
}
