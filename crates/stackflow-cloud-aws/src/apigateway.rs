//! REST APIs backed by Lambda handlers

use stackflow_core::{
    Output, ProgramContext, PropertyMap, Resource, ResourceArgs, ResourceHandle, ResourceOptions,
    Result, StackError, Tags,
};
use std::fmt;

pub const REST_API: &str = "aws:apigateway:RestAPI";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Any,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Any => "ANY",
        };
        f.write_str(s)
    }
}

/// One route dispatched to a Lambda function
#[derive(Debug, Clone)]
pub struct Route {
    pub path: String,
    pub method: Method,
    /// Invoke ARN of the handling function
    pub event_handler: Output<String>,
}

impl Route {
    pub fn new(method: Method, path: impl Into<String>, event_handler: Output<String>) -> Self {
        Self {
            path: path.into(),
            method,
            event_handler,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RestApiArgs {
    pub routes: Vec<Route>,
    pub stage_name: String,
    pub tags: Tags,
}

impl ResourceArgs for RestApiArgs {
    fn resource_type(&self) -> &'static str {
        REST_API
    }

    fn into_properties(self) -> Result<PropertyMap> {
        let mut seen = std::collections::HashSet::new();
        for route in &self.routes {
            if !route.path.starts_with('/') {
                return Err(StackError::InvalidArgs(format!(
                    "route path '{}' must start with '/'",
                    route.path
                )));
            }
            if !seen.insert((route.method, route.path.as_str())) {
                return Err(StackError::InvalidArgs(format!(
                    "route {} {} is declared twice",
                    route.method, route.path
                )));
            }
        }
        if self.stage_name.is_empty() {
            return Err(StackError::InvalidArgs("stage name is empty".to_string()));
        }

        let routes: Vec<PropertyMap> = self
            .routes
            .into_iter()
            .map(|r| {
                PropertyMap::new()
                    .with("path", r.path)
                    .with("method", r.method.to_string())
                    .with("eventHandler", r.event_handler)
            })
            .collect();

        Ok(PropertyMap::new()
            .with("routes", routes)
            .with("stageName", self.stage_name)
            .with("tags", self.tags))
    }
}

#[derive(Debug, Clone)]
pub struct RestApi {
    handle: ResourceHandle,
}

impl RestApi {
    pub fn new(
        ctx: &mut ProgramContext,
        name: &str,
        args: RestApiArgs,
        options: ResourceOptions,
    ) -> Result<Self> {
        let handle = ctx.register(name, args, options)?;
        Ok(Self { handle })
    }

    /// Invoke URL of the deployed stage
    pub fn url(&self) -> Output<String> {
        self.handle.output("url")
    }
}

impl Resource for RestApi {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::{ConfigStore, StackName};

    fn ctx() -> ProgramContext {
        ProgramContext::new("app", StackName::new("dev").unwrap(), ConfigStore::new())
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut ctx = ctx();
        let handler: Output<String> = "arn:fn".into();
        let args = RestApiArgs {
            routes: vec![
                Route::new(Method::Get, "/items", handler.clone()),
                Route::new(Method::Get, "/items", handler),
            ],
            stage_name: "dev".into(),
            tags: Tags::new(),
        };
        assert!(matches!(
            RestApi::new(&mut ctx, "api", args, ResourceOptions::default()),
            Err(StackError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_same_path_different_methods() {
        let mut ctx = ctx();
        let handler: Output<String> = "arn:fn".into();
        let args = RestApiArgs {
            routes: vec![
                Route::new(Method::Get, "/items", handler.clone()),
                Route::new(Method::Post, "/items", handler),
            ],
            stage_name: "dev".into(),
            tags: Tags::new(),
        };
        RestApi::new(&mut ctx, "api", args, ResourceOptions::default()).unwrap();
        let props = ctx.finish().get("api").unwrap().properties.known_value().unwrap();
        assert_eq!(props["routes"][1]["method"], "POST");
    }
}
