//! Layered client configuration.
//!
//! Values merge in a fixed order: built-in defaults, then the YAML file,
//! then `ERPQ__`-prefixed environment variables, so a deployment can ship
//! one file and still override the token per host.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Connection settings for the ERP REST endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ErpConfig {
    /// Base URL of the REST API, e.g. `https://erp.example.edu/api/v1/`.
    pub base_url: String,

    /// Bearer token. Usually left out of the file and injected through
    /// `ERPQ__AUTH_TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Per-request timeout (humantime format in YAML, e.g. `30s`).
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub request_timeout: Duration,

    /// Page size applied when a query does not set its own `$top`.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_page_size() -> u64 {
    20
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1/".to_string(),
            auth_token: None,
            request_timeout: default_timeout(),
            default_page_size: default_page_size(),
        }
    }
}

impl ErpConfig {
    /// Load configuration from a YAML file, with defaults underneath and
    /// environment variables (`ERPQ__BASE_URL`, `ERPQ__AUTH_TOKEN`, ...)
    /// on top.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        Self::assemble(Some(config_path.as_ref()))
    }

    /// Like [`Self::load_layered`], but a missing path still honors the
    /// environment layer.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        Self::assemble(config_path.as_ref().map(AsRef::as_ref))
    }

    fn assemble(config_path: Option<&Path>) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("ERPQ__").split("__"))
            .extract()
            .context("failed to assemble ERP client configuration")
    }

    /// Render the effective configuration back to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize configuration to YAML")
    }
}
