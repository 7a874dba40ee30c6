//! Transport-level error taxonomy.

/// Errors produced by the HTTP client and envelope decoding.
///
/// The repository layer absorbs these for the UI-facing operations; they
/// stay visible through the `try_` variants and the client itself.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("http status {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection, TLS, or timeout failure below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON shape we expected.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The configured base URL (or a path joined onto it) is not a URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// True for a plain 404, which record lookups treat as "absent"
    /// rather than as a failure worth logging loudly.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}
