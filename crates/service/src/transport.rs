//! HTTP transport seam.
//!
//! `RestApiService` only sees `HttpTransport`; `ReqwestTransport` is the
//! production implementation, tests plug in their own.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::instrument;

pub use reqwest::Method;

use crate::errors::TransportError;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), body: None, headers: Vec::new() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// JSON body, sent with `Content-Type: application/json`.
    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn put(url: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, url).with_body(body)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs the request; 2xx bodies come back as JSON (`Null` when empty).
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError>;
}

#[async_trait]
trait ResponseExt {
    async fn map_transport_error(self) -> Result<Response, TransportError>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn map_transport_error(self) -> Result<Response, TransportError> {
        let status: StatusCode = self.status();
        if status.is_success() {
            return Ok(self);
        }
        let body = self.text().await.unwrap_or_default();
        Err(TransportError::status(status.as_u16(), &body))
    }
}

#[async_trait]
impl ResponseExt for Result<Response, reqwest::Error> {
    async fn map_transport_error(self) -> Result<Response, TransportError> {
        match self {
            Ok(response) => response.map_transport_error().await,
            Err(e) => Err(TransportError::Client(e.to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_transport_error().await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Client(format!("unable to read response body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Client(format!("unable to parse response body: {e}")))
    }
}
