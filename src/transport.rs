//! HTTP round trip to the chat endpoint

use crate::config::Config;
use crate::error::DispatchError;
use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::time::Duration;
use tracing::{debug, warn};

/// Sends one user message and yields the reply text
pub trait ChatTransport: Send + Sync {
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, DispatchError>>;
}

/// Body shape returned by the endpoint
#[derive(Debug, Deserialize)]
struct ChatReply {
    response: Option<String>,
    error: Option<String>,
}

/// Transport that POSTs `{ <field>: text }` as JSON to a fixed URL
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    request_field: String,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid endpoint URL: {}", config.endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            anyhow::bail!("Endpoint must be an http or https URL: {}", config.endpoint);
        }
        if config.request_field.trim().is_empty() {
            anyhow::bail!("request_field must not be empty");
        }

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            request_field: config.request_field.clone(),
        })
    }

    fn request_body(&self, text: &str) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert(self.request_field.clone(), Value::String(text.to_string()));
        body
    }
}

impl ChatTransport for HttpTransport {
    fn send<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<String, DispatchError>> {
        Box::pin(async move {
            debug!(endpoint = %self.endpoint, field = %self.request_field, "posting chat message");

            let response = self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, "application/json")
                .json(&self.request_body(text))
                .send()
                .await?;

            let status = response.status();
            let body = response.bytes().await?;

            if !status.is_success() {
                warn!(
                    status = status.as_u16(),
                    body = %String::from_utf8_lossy(&body),
                    "chat endpoint returned an error status"
                );
                return Err(DispatchError::Status(status.as_u16()));
            }

            parse_reply(&body)
        })
    }
}

/// Interpret a response body as `{ response }` or `{ error }`.
///
/// An empty `error` string does not count as an error.
pub fn parse_reply(body: &[u8]) -> Result<String, DispatchError> {
    let reply: ChatReply = serde_json::from_slice(body)?;

    if let Some(error) = reply.error.filter(|e| !e.is_empty()) {
        return Err(DispatchError::Remote(error));
    }

    reply.response.ok_or(DispatchError::MissingResponse)
}
