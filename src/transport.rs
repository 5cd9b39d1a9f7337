//! GraphQL transport seam.
//!
//! The gateway only needs "send one document, get one response back". The
//! trait keeps that contract small so tests can drop in a stub and the
//! binary can use [`HttpTransport`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Standard GraphQL-over-HTTP request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub variables: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Null,
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// One entry of the response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlErrorEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<Value>>,
}

/// Standard GraphQL response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQlErrorEntry>,
}

impl GraphQlResponse {
    pub fn from_data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// `data.<root>.<key>`, treating JSON `null` as absent.
    pub fn field(&self, root: &str, key: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|data| data.get(root))
            .and_then(|root| root.get(key))
            .filter(|value| !value.is_null())
    }

    pub fn error_messages(&self) -> Vec<&str> {
        self.errors.iter().map(|entry| entry.message.as_str()).collect()
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("graphql errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),
}

/// Single request/response exchange with a GraphQL endpoint.
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError>;
}

#[async_trait]
impl<T: GraphQlTransport + ?Sized> GraphQlTransport for Arc<T> {
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        (**self).execute(request).await
    }
}

// =============================================================================
// HTTP transport
// =============================================================================

/// reqwest-backed transport posting JSON to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: String,
    auth_token: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            auth_token,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphQlTransport for HttpTransport {
    async fn execute(&self, request: GraphQlRequest) -> Result<GraphQlResponse, TransportError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(token) = self.auth_token.as_ref() {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let resp = builder.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = resp.text().await?;
        let response: GraphQlResponse =
            serde_json::from_str(&body).map_err(|err| TransportError::Decode(err.to_string()))?;

        if !response.errors.is_empty() {
            tracing::warn!(
                endpoint = %self.endpoint,
                errors = ?response.error_messages(),
                "graphql response carried errors"
            );
            if response.data.is_none() {
                return Err(TransportError::GraphQl(
                    response.errors.into_iter().map(|entry| entry.message).collect(),
                ));
            }
        }

        Ok(response)
    }
}
