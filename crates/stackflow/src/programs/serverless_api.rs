//! Lambda + API Gateway + DynamoDB REST API

use stackflow_cloud_aws::apigateway::{Method, RestApi, RestApiArgs, Route};
use stackflow_cloud_aws::cloudwatch::{LogGroup, LogGroupArgs};
use stackflow_cloud_aws::dynamodb::{AttributeType, BillingMode, Table, TableArgs, TableAttribute};
use stackflow_cloud_aws::iam::{
    LAMBDA_BASIC_EXECUTION_POLICY, PolicyDocument, Role, RoleArgs, RolePolicyArgs,
    RolePolicyAttachmentArgs, attach_role_policy, role_policy,
};
use stackflow_cloud_aws::lambda::{AssetArchive, Function, FunctionArgs};
use stackflow_core::{Output, Program, ProgramContext, ResourceOptions, Result, Tags};

pub const APP_NAME: &str = "serverless-api";

/// Handler shipped inline with the function
pub const HANDLER_SOURCE: &str = include_str!("../../assets/serverless-api/index.py");

const TABLE_ACTIONS: &[&str] = &[
    "dynamodb:PutItem",
    "dynamodb:GetItem",
    "dynamodb:UpdateItem",
    "dynamodb:DeleteItem",
    "dynamodb:Scan",
    "dynamodb:Query",
];

pub struct ServerlessApi;

impl Program for ServerlessApi {
    fn name(&self) -> &str {
        APP_NAME
    }

    fn description(&self) -> &str {
        "Serverless REST API on Lambda, API Gateway and DynamoDB"
    }

    fn run(&self, ctx: &mut ProgramContext) -> Result<()> {
        let region = stackflow_cloud_aws::region(&ctx.config_for(stackflow_cloud_aws::PACKAGE));
        let environment = ctx.stack().to_string();
        let tags = Tags::standard(ctx.stack()).with("Application", APP_NAME);

        let table = Table::new(
            ctx,
            &format!("{}-table", APP_NAME),
            TableArgs {
                name: Some(format!("{}-{}-items", APP_NAME, environment).into()),
                attributes: vec![TableAttribute::new("id", AttributeType::String)],
                hash_key: "id".to_string(),
                billing_mode: BillingMode::PayPerRequest,
                point_in_time_recovery: true,
                server_side_encryption: true,
                tags: tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        let role = Role::new(
            ctx,
            &format!("{}-lambda-role", APP_NAME),
            RoleArgs {
                name: None,
                assume_role_policy: PolicyDocument::assume_role("lambda.amazonaws.com").to_json()?,
                tags: tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        attach_role_policy(
            ctx,
            &format!("{}-lambda-basic", APP_NAME),
            RolePolicyAttachmentArgs {
                role: role.name(),
                policy_arn: LAMBDA_BASIC_EXECUTION_POLICY.to_string(),
            },
        )?;

        role_policy(
            ctx,
            &format!("{}-dynamodb-policy", APP_NAME),
            RolePolicyArgs {
                role: role.name(),
                policy: PolicyDocument::allow_deferred(TABLE_ACTIONS, &table.arn()),
            },
        )?;

        let mut function_args = FunctionArgs::new(
            role.arn(),
            "python3.11",
            "index.handler",
            AssetArchive::new().with_file("index.py", HANDLER_SOURCE),
        );
        function_args.name = Some(format!("{}-{}-handler", APP_NAME, environment).into());
        function_args
            .environment
            .insert("TABLE_NAME".to_string(), table.name());
        function_args.timeout = 30;
        function_args.memory_size = 256;
        function_args.tags = tags.clone();
        let function = Function::new(
            ctx,
            &format!("{}-handler", APP_NAME),
            function_args,
            ResourceOptions::default(),
        )?;

        LogGroup::new(
            ctx,
            &format!("{}-logs", APP_NAME),
            LogGroupArgs {
                name: Output::concat([Output::from("/aws/lambda/"), function.name()]),
                retention_in_days: Some(7),
                tags: tags.clone(),
            },
            ResourceOptions::default(),
        )?;

        let api = RestApi::new(
            ctx,
            &format!("{}-api", APP_NAME),
            RestApiArgs {
                routes: vec![
                    Route::new(Method::Get, "/items", function.invoke_arn()),
                    Route::new(Method::Post, "/items", function.invoke_arn()),
                    Route::new(Method::Get, "/items/{id}", function.invoke_arn()),
                ],
                stage_name: environment,
                tags,
            },
            ResourceOptions::default(),
        )?;

        ctx.export("api_url", api.url())?;
        ctx.export("table_name", table.name())?;
        ctx.export("lambda_function_name", function.name())?;
        ctx.export("region", region)?;
        Ok(())
    }
}
