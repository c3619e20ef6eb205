//! GraphQL request and response shapes.
//!
//! An [`Operation`] is built once per call site and then only read: the
//! executor serialises it to the wire body `{"query", "variables"}` (plus
//! `operationName` when set) and never mutates it.
//!
//! A [`GraphqlResponse`] is the decoded body of a successful HTTP exchange.
//! GraphQL-level `errors` live *inside* it; they are not executor failures.
//! [`GraphqlResponse::into_data`] is the explicit check that turns them into
//! an [`ExecutionError`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ExecutionError;

/// Result of executing one operation.
pub type ExecutionResult<T> = Result<GraphqlResponse<T>, ExecutionError>;

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// One GraphQL query or mutation: operation text plus variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    query: String,
    variables: Map<String, Value>,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    operation_name: Option<String>,
}

impl Operation {
    /// Creates an operation with no variables.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            operation_name: None,
        }
    }

    /// Sets the operation name sent as `operationName`.
    ///
    /// Only needed when the document contains more than one operation; it is
    /// also what the executor records on its tracing span.
    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Adds (or replaces) one variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Adds a variable only when `value` is present.
    ///
    /// Absent optionals are omitted rather than sent as `null` so the server
    /// applies its own defaults.
    #[must_use]
    pub fn with_optional_variable<V: Into<Value>>(
        self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_variable(name, value),
            None => self,
        }
    }

    /// Replaces all variables with the fields of a JSON object.
    ///
    /// Used by callers that load raw operations from files.
    pub fn with_variables_object(mut self, variables: Value) -> Result<Self, ExecutionError> {
        match variables {
            Value::Object(map) => {
                self.variables = map;
                Ok(self)
            }
            Value::Null => {
                self.variables = Map::new();
                Ok(self)
            }
            other => Err(ExecutionError::Configuration {
                message: format!("variables must be a JSON object, got {other}"),
            }),
        }
    }

    /// The operation text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The variables map.
    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// The operation name, if one was set.
    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    /// Serialises the operation into the JSON request body.
    pub fn to_body(&self) -> Result<Vec<u8>, ExecutionError> {
        serde_json::to_vec(self).map_err(|err| ExecutionError::Configuration {
            message: format!("operation could not be serialised: {err}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// GraphQL error location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    /// Line number in the query (1-based).
    pub line: u32,
    /// Column number in the query (1-based).
    pub column: u32,
}

/// GraphQL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphqlPathSegment {
    /// Field name.
    Key(String),
    /// Array index.
    Index(i64),
}

/// One entry of the response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default)]
    pub locations: Vec<GraphqlErrorLocation>,
    /// Path within the response where the error occurred.
    #[serde(default)]
    pub path: Vec<GraphqlPathSegment>,
    /// Extensions metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Decoded response body.
///
/// `data` may be partial or absent when `errors` is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct GraphqlResponse<T> {
    /// Response data.
    #[serde(default)]
    pub data: Option<T>,
    /// GraphQL errors.
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
    /// Extensions payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl<T> GraphqlResponse<T> {
    /// Returns `true` if no GraphQL errors were returned.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the data, treating any GraphQL error as a failure.
    ///
    /// Errors take precedence over partial data.
    pub fn into_data(self) -> Result<T, ExecutionError> {
        if !self.errors.is_empty() {
            return Err(ExecutionError::Graphql {
                errors: self.errors,
            });
        }
        self.data.ok_or(ExecutionError::MissingData)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn body_has_query_and_variables_only_when_unnamed() {
        let op = Operation::new("query { viewer { id } }").with_variable("size", 30);
        let body: Value = serde_json::from_slice(&op.to_body().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"query": "query { viewer { id } }", "variables": {"size": 30}})
        );
    }

    #[test]
    fn named_operation_sends_operation_name() {
        let op = Operation::new("query A { a } query B { b }").with_operation_name("B");
        let body: Value = serde_json::from_slice(&op.to_body().unwrap()).unwrap();
        assert_eq!(body["operationName"], json!("B"));
        assert_eq!(body["variables"], json!({}));
    }

    #[test]
    fn optional_variables_are_omitted_when_absent() {
        let op = Operation::new("q")
            .with_optional_variable("email", None::<String>)
            .with_optional_variable("name", Some("Ada"));
        assert!(!op.variables().contains_key("email"));
        assert_eq!(op.variables()["name"], json!("Ada"));
    }

    #[test]
    fn variables_object_must_be_an_object() {
        let err = Operation::new("q")
            .with_variables_object(json!([1, 2]))
            .unwrap_err();
        assert!(matches!(err, ExecutionError::Configuration { .. }));
    }

    #[test]
    fn into_data_prefers_errors_over_partial_data() {
        let response: GraphqlResponse<Value> = serde_json::from_value(json!({
            "data": {"updateCustomer": null},
            "errors": [{"message": "Customer not found", "path": ["updateCustomer"]}]
        }))
        .unwrap();
        assert!(!response.is_ok());
        match response.into_data() {
            Err(ExecutionError::Graphql { errors }) => {
                assert_eq!(errors[0].message, "Customer not found");
                assert_eq!(
                    errors[0].path,
                    vec![GraphqlPathSegment::Key("updateCustomer".into())]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn into_data_without_data_or_errors_is_missing_data() {
        let response: GraphqlResponse<Value> = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            response.into_data(),
            Err(ExecutionError::MissingData)
        ));
    }
}
