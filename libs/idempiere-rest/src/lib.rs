//! Client for the iDempiere REST API.
//!
//! Three layers, bottom up: an authenticated [`client::HttpClient`] that
//! speaks JSON over HTTP, the [`envelope`] module that decodes the
//! backend's paginated response shape, and the [`repository`] that turns
//! both into typed, page-oriented entity access. Configuration is loaded
//! through [`config::ErpConfig`] with defaults, YAML, and environment
//! layered in that order.
//!
//! Failure policy is set at the repository layer: list queries absorb
//! errors into an empty page, record operations into `None`, deletes into
//! `false`. Callers that need the underlying error use the `try_` variants.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod repository;

pub use client::{HttpClient, RestClient};
pub use config::ErpConfig;
pub use envelope::{PageEnvelope, PaginatedResponse};
pub use error::ClientError;
pub use repository::{EntityRepository, Pagination};
