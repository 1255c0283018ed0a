//! Client configuration for the HTTP transport shared by pipes and authentication modules

use crate::error::{PipeError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Whole-request timeout in seconds
    pub timeout: u64,
    pub connect_timeout: u64,
    pub skip_tls: bool,
    pub verbose: bool,
    pub user_agent: String,
}

/// Settings given explicitly, e.g. on the command line; `None` leaves the
/// base value untouched even when it differs from the default
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub timeout: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub skip_tls: Option<bool>,
    pub verbose: Option<bool>,
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: 60,
            connect_timeout: 10,
            skip_tls: false,
            verbose: false,
            user_agent: format!("aerogear-pipes/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_skip_tls(mut self, skip_tls: bool) -> Self {
        self.skip_tls = skip_tls;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(PipeError::Validation(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout == 0 {
            return Err(PipeError::Validation(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }
        if self.connect_timeout > self.timeout {
            return Err(PipeError::Validation(format!(
                "connect_timeout ({}s) cannot exceed timeout ({}s)",
                self.connect_timeout, self.timeout
            )));
        }
        Ok(())
    }

    /// Create config from environment variables and defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("AEROGEAR_TIMEOUT") {
            if let Ok(timeout) = val.parse() {
                config.timeout = timeout;
            }
        }
        if let Ok(val) = std::env::var("AEROGEAR_CONNECT_TIMEOUT") {
            if let Ok(connect_timeout) = val.parse() {
                config.connect_timeout = connect_timeout;
            }
        }
        if let Ok(val) = std::env::var("AEROGEAR_SKIP_TLS") {
            config.skip_tls = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = std::env::var("AEROGEAR_VERBOSE") {
            config.verbose = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Apply the settings present in `overrides`, keeping everything else
    pub fn merge(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(connect_timeout) = overrides.connect_timeout {
            self.connect_timeout = connect_timeout;
        }
        if let Some(skip_tls) = overrides.skip_tls {
            self.skip_tls = skip_tls;
        }
        if let Some(verbose) = overrides.verbose {
            self.verbose = verbose;
        }
        if let Some(user_agent) = &overrides.user_agent {
            self.user_agent = user_agent.clone();
        }

        self
    }

    /// Build the reqwest client every provider created from this config shares
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        self.validate()?;

        let builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout))
            .connect_timeout(Duration::from_secs(self.connect_timeout))
            .user_agent(self.user_agent.clone());

        let builder = if self.skip_tls {
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true)
        } else {
            builder
        };

        builder.build().map_err(|e| {
            PipeError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
        })
    }
}
