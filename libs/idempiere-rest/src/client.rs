//! Authenticated JSON transport to the ERP REST endpoint.
//!
//! Wraps `reqwest::Client` so every request runs inside a client span
//! (`http.method`, `http.url`, `otel.kind = "client"`) with the response
//! status recorded on the way out. The [`RestClient`] trait is the seam
//! the repository is written against, which keeps it testable without a
//! live server.

use async_trait::async_trait;
use serde_json::Value;
use tracing::Level;
use url::Url;

use crate::config::ErpConfig;
use crate::error::ClientError;

/// JSON-over-HTTP capability the repository depends on.
///
/// Paths are relative to the configured base URL. Non-2xx statuses come
/// back as [`ClientError::Http`] with the body attached; an empty 2xx
/// body decodes to `Value::Null`.
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, ClientError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError>;
    async fn put(&self, path: &str, body: &Value) -> Result<Value, ClientError>;
    async fn delete(&self, path: &str) -> Result<Value, ClientError>;
}

/// `reqwest`-backed [`RestClient`] with bearer authentication and
/// per-request tracing spans.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// [`ClientError::InvalidUrl`] when the configured base URL does not
    /// parse, [`ClientError::Transport`] when the underlying client cannot
    /// be constructed.
    pub fn new(config: &ErpConfig) -> Result<Self, ClientError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Self::with_client(inner, &config.base_url, config.auth_token.clone())
    }

    /// Wrap an existing `reqwest::Client`. The base URL gains a trailing
    /// slash if it lacks one, so joined paths append to it instead of
    /// replacing its last segment.
    pub fn with_client(
        inner: reqwest::Client,
        base_url: &str,
        token: Option<String>,
    ) -> Result<Self, ClientError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| ClientError::InvalidUrl(format!("{base}: {e}")))?;
        Ok(Self {
            inner,
            base_url,
            token,
        })
    }

    /// Access the underlying `reqwest::Client` for advanced usage.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Execute a built request inside a client span and decode the body.
    async fn execute(&self, req: reqwest::Request) -> Result<Value, ClientError> {
        let span = tracing::span!(
            Level::INFO, "erp_http",
            http.method = %req.method(),
            http.url = %req.url(),
            otel.kind = "client",
            http.status_code = tracing::field::Empty,
            error = tracing::field::Empty,
        );
        let _g = span.enter();

        let response = self.inner.execute(req).await?;
        let status = response.status();
        span.record("http.status_code", status.as_u16());
        if status.is_client_error() || status.is_server_error() {
            span.record("error", true);
            let body = response.text().await?;
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl RestClient for HttpClient {
    async fn get(&self, path: &str, params: &[(String, String)]) -> Result<Value, ClientError> {
        let url = self.endpoint(path)?;
        let req = self.authorize(self.inner.get(url).query(params)).build()?;
        self.execute(req).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let url = self.endpoint(path)?;
        let req = self.authorize(self.inner.post(url).json(body)).build()?;
        self.execute(req).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        let url = self.endpoint(path)?;
        let req = self.authorize(self.inner.put(url).json(body)).build()?;
        self.execute(req).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        let url = self.endpoint(path)?;
        let req = self.authorize(self.inner.delete(url)).build()?;
        self.execute(req).await
    }
}
