//! Deferred output values
//!
//! An [`Output`] is a placeholder for a value that is only known once the
//! declaration producing it has been materialized by an engine. Declaring
//! against an output never blocks or fails; the expression is recorded and
//! evaluated later against the resolved outputs of every declaration.

use crate::error::{Result, StackError};
use crate::stack::Urn;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Lookup of materialized outputs by declaration
pub trait ResolvedOutputs {
    fn outputs_of(&self, urn: &Urn) -> Option<&Value>;
}

impl<S: std::hash::BuildHasher> ResolvedOutputs for HashMap<Urn, Value, S> {
    fn outputs_of(&self, urn: &Urn) -> Option<&Value> {
        self.get(urn)
    }
}

impl ResolvedOutputs for BTreeMap<Urn, Value> {
    fn outputs_of(&self, urn: &Urn) -> Option<&Value> {
        self.get(urn)
    }
}

/// Resolver for expressions that contain no references
struct NothingResolved;

impl ResolvedOutputs for NothingResolved {
    fn outputs_of(&self, _urn: &Urn) -> Option<&Value> {
        None
    }
}

type ApplyFn = dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync;

/// Untyped deferred expression
#[derive(Clone)]
pub enum OutputExpr {
    /// A value known at declaration time
    Known(Value),
    /// A (possibly nested) field of another declaration's outputs
    Property { urn: Urn, path: Vec<String> },
    /// A pure function over other expressions
    Apply {
        inputs: Vec<OutputExpr>,
        func: Arc<ApplyFn>,
    },
}

impl OutputExpr {
    pub fn known(value: impl Into<Value>) -> Self {
        OutputExpr::Known(value.into())
    }

    pub fn property(urn: Urn, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        OutputExpr::Property {
            urn,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Combine `inputs` with `func`. Folds to a known value when every input
    /// is already known and the function succeeds.
    pub fn apply<F>(inputs: Vec<OutputExpr>, func: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        let known: Option<Vec<Value>> = inputs.iter().map(|i| i.known_value()).collect();
        if let Some(values) = known
            && let Ok(value) = func(&values)
        {
            return OutputExpr::Known(value);
        }

        OutputExpr::Apply {
            inputs,
            func: Arc::new(func),
        }
    }

    /// Declarations this expression waits on
    pub fn dependencies(&self) -> BTreeSet<Urn> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    pub(crate) fn collect_dependencies(&self, deps: &mut BTreeSet<Urn>) {
        match self {
            OutputExpr::Known(_) => {}
            OutputExpr::Property { urn, .. } => {
                deps.insert(urn.clone());
            }
            OutputExpr::Apply { inputs, .. } => {
                for input in inputs {
                    input.collect_dependencies(deps);
                }
            }
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, OutputExpr::Known(_))
    }

    pub fn known_value(&self) -> Option<Value> {
        match self {
            OutputExpr::Known(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Evaluate against materialized outputs
    pub fn resolve(&self, outputs: &dyn ResolvedOutputs) -> Result<Value> {
        match self {
            OutputExpr::Known(value) => Ok(value.clone()),
            OutputExpr::Property { urn, path } => {
                let root = outputs.outputs_of(urn).ok_or_else(|| {
                    StackError::Resolution(format!("outputs of {} are not available yet", urn))
                })?;
                Ok(lookup_path(root, path).cloned().unwrap_or(Value::Null))
            }
            OutputExpr::Apply { inputs, func } => {
                let values = inputs
                    .iter()
                    .map(|input| input.resolve(outputs))
                    .collect::<Result<Vec<_>>>()?;
                func(&values).map_err(StackError::Resolution)
            }
        }
    }

    /// Evaluate without any materialized outputs
    pub fn resolve_known(&self) -> Result<Value> {
        self.resolve(&NothingResolved)
    }

    /// JSON rendering used when printing an unresolved graph
    pub fn describe(&self) -> Value {
        match self {
            OutputExpr::Known(value) => value.clone(),
            OutputExpr::Property { urn, path } => json!({
                "$output": urn.to_string(),
                "path": path.join("."),
            }),
            OutputExpr::Apply { .. } => {
                let deps: Vec<String> = self.dependencies().iter().map(Urn::to_string).collect();
                json!({ "$computed": deps })
            }
        }
    }
}

fn lookup_path<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

impl fmt::Debug for OutputExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputExpr::Known(value) => f.debug_tuple("Known").field(value).finish(),
            OutputExpr::Property { urn, path } => f
                .debug_struct("Property")
                .field("urn", &urn.to_string())
                .field("path", path)
                .finish(),
            OutputExpr::Apply { inputs, .. } => {
                f.debug_struct("Apply").field("inputs", inputs).finish()
            }
        }
    }
}

impl Serialize for OutputExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.describe().serialize(serializer)
    }
}

fn decode<T: DeserializeOwned>(value: &Value) -> std::result::Result<T, String> {
    serde_json::from_value(value.clone()).map_err(|e| format!("unexpected output shape: {}", e))
}

fn encode<T: Serialize>(value: T) -> std::result::Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

/// Typed deferred value
pub struct Output<T> {
    expr: OutputExpr,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self::from_expr(self.expr.clone())
    }
}

impl<T> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Output").field(&self.expr).finish()
    }
}

impl<T> Output<T> {
    pub fn from_expr(expr: OutputExpr) -> Self {
        Self {
            expr,
            _type: PhantomData,
        }
    }

    /// A value known at declaration time
    pub fn known(value: impl Into<Value>) -> Self {
        Self::from_expr(OutputExpr::known(value))
    }

    pub fn expr(&self) -> &OutputExpr {
        &self.expr
    }

    pub fn into_expr(self) -> OutputExpr {
        self.expr
    }

    pub fn dependencies(&self) -> BTreeSet<Urn> {
        self.expr.dependencies()
    }

    pub fn is_known(&self) -> bool {
        self.expr.is_known()
    }

    /// Drop the static type
    pub fn untyped(self) -> Output<Value> {
        Output::from_expr(self.expr)
    }

    /// A nested field of this output
    pub fn field<U>(&self, key: &str) -> Output<U> {
        let expr = match &self.expr {
            OutputExpr::Property { urn, path } => {
                let mut path = path.clone();
                path.push(key.to_string());
                OutputExpr::Property {
                    urn: urn.clone(),
                    path,
                }
            }
            other => {
                let key = key.to_string();
                OutputExpr::apply(vec![other.clone()], move |values| {
                    Ok(lookup_path(&values[0], std::slice::from_ref(&key))
                        .cloned()
                        .unwrap_or(Value::Null))
                })
            }
        };
        Output::from_expr(expr)
    }
}

impl<T: DeserializeOwned + 'static> Output<T> {
    /// Transform the eventual value
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Serialize,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.try_apply(move |value| Ok(f(value)))
    }

    /// Transform the eventual value with a fallible function
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Serialize,
        F: Fn(T) -> std::result::Result<U, String> + Send + Sync + 'static,
    {
        let expr = OutputExpr::apply(vec![self.expr.clone()], move |values| {
            let input: T = decode(&values[0])?;
            encode(f(input)?)
        });
        Output::from_expr(expr)
    }

    /// Pair this output with another one
    pub fn zip<U>(&self, other: &Output<U>) -> Output<(T, U)> {
        let expr = OutputExpr::apply(
            vec![self.expr.clone(), other.expr.clone()],
            |values| Ok(Value::Array(values.to_vec())),
        );
        Output::from_expr(expr)
    }

    pub fn resolve(&self, outputs: &dyn ResolvedOutputs) -> Result<T> {
        let value = self.expr.resolve(outputs)?;
        decode(&value).map_err(StackError::Resolution)
    }
}

impl Output<String> {
    /// Concatenate string outputs, e.g. `"/aws/lambda/" + function.name`
    pub fn concat<I, P>(parts: I) -> Output<String>
    where
        I: IntoIterator<Item = P>,
        P: Into<Output<String>>,
    {
        let inputs = parts.into_iter().map(|p| p.into().into_expr()).collect();
        let expr = OutputExpr::apply(inputs, |values| {
            let joined: String = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            Ok(Value::String(joined))
        });
        Output::from_expr(expr)
    }
}

impl Output<Value> {
    /// Every input as one array value
    pub fn all(outputs: impl IntoIterator<Item = OutputExpr>) -> Output<Vec<Value>> {
        let expr = OutputExpr::apply(outputs.into_iter().collect(), |values| {
            Ok(Value::Array(values.to_vec()))
        });
        Output::from_expr(expr)
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Output::known(value)
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Output::known(value)
    }
}

impl From<&String> for Output<String> {
    fn from(value: &String) -> Self {
        Output::known(value.as_str())
    }
}

impl From<&Output<String>> for Output<String> {
    fn from(value: &Output<String>) -> Self {
        value.clone()
    }
}
