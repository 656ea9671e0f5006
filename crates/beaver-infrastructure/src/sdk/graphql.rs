//! GraphQL over HTTP
//!
//! Requests are `POST { query, variables }`; responses carry `data` and/or
//! `errors`. Any entry in `errors` fails the whole request.

use crate::config::ApiConfig;
use crate::error_ext::ErrorContext;
use async_trait::async_trait;
use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::{Error, Result};
use beaver_domain::ports::GraphQlTransport;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

/// Name of the first operation in a GraphQL document
///
/// Anonymous operations are named after their kind.
pub fn operation_name(document: &str) -> &str {
    let document = document.trim_start();
    for kind in ["query", "mutation", "subscription"] {
        let Some(rest) = document.strip_prefix(kind) else {
            continue;
        };
        if rest.starts_with(is_name_char) {
            continue;
        }
        let rest = rest.trim_start();
        let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        return if end == 0 { kind } else { &rest[..end] };
    }
    "query"
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Unwrap a GraphQL response body into its `data` document
pub fn unwrap_response(operation: &str, body: Value) -> Result<Value> {
    let response: GraphQlResponse = serde_json::from_value(body)?;
    if !response.errors.is_empty() {
        return Err(Error::GraphQl {
            operation: operation.to_string(),
            messages: response.errors.into_iter().map(|e| e.message).collect(),
        });
    }

    response.data.ok_or_else(|| Error::Transport {
        message: format!("Response to '{operation}' carries neither data nor errors"),
        source: None,
    })
}

/// [`GraphQlTransport`] posting to an HTTP endpoint with `reqwest`
pub struct HttpGraphQlTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGraphQlTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .network_context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl GraphQlTransport for HttpGraphQlTransport {
    async fn request(&self, operation: &str, variables: Value) -> Result<Value> {
        let name = operation_name(operation);
        debug!(operation = name, endpoint = %self.endpoint, "GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&GraphQlRequest {
                query: operation,
                variables,
            })
            .send()
            .await
            .network_context(format!("GraphQL request '{name}' failed"))?
            .error_for_status()
            .network_context(format!("GraphQL request '{name}' rejected"))?;

        let body: Value = response
            .json()
            .await
            .network_context(format!("Invalid response to '{name}'"))?;

        unwrap_response(name, body)
    }

    fn transport_name(&self) -> &str {
        "http"
    }
}

impl fmt::Debug for HttpGraphQlTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGraphQlTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Transport port registered as a service of its own
pub struct TransportBinding(pub Arc<dyn GraphQlTransport>);

impl Service for TransportBinding {}

/// Entry point of resources to the GraphQL API
pub struct GraphQlService {
    transport: Arc<dyn GraphQlTransport>,
}

impl GraphQlService {
    pub fn new(transport: Arc<dyn GraphQlTransport>) -> Self {
        Self { transport }
    }

    /// Raw `data` document of `operation`
    pub async fn request(&self, operation: &str, variables: Value) -> Result<Value> {
        self.transport.request(operation, variables).await
    }

    /// `data` document of `operation` deserialized into `T`
    pub async fn query<T: DeserializeOwned>(&self, operation: &str, variables: Value) -> Result<T> {
        let data = self.request(operation, variables).await?;
        serde_json::from_value(data).map_err(|err| Error::Transport {
            message: format!(
                "Unexpected response shape for '{}': {err}",
                operation_name(operation)
            ),
            source: Some(Box::new(err)),
        })
    }

    pub fn transport_name(&self) -> &str {
        self.transport.transport_name()
    }
}

impl Service for GraphQlService {}

impl Injectable for GraphQlService {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<TransportBinding>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        let binding = deps.get::<TransportBinding>()?;
        Ok(Self::new(Arc::clone(&binding.0)))
    }
}

impl fmt::Debug for GraphQlService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphQlService")
            .field("transport", &self.transport_name())
            .finish()
    }
}
