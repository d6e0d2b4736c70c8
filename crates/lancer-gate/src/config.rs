use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::GateError;
use crate::secret::Secret;

#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub signing_secret: Option<Secret>,
    #[serde(default)]
    pub webhook_verification: bool,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_auth_path")]
    pub auth_path: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    #[serde(default = "default_max_body")]
    pub max_body_size: usize,
    #[serde(default)]
    pub handler_timeout_secs: Option<u64>,
    #[serde(default)]
    pub timestamp_tolerance_secs: Option<u64>,
}

fn default_bind() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    8090
}

fn default_auth_path() -> String {
    "/auth".into()
}

fn default_webhook_path() -> String {
    "/webhook".into()
}

fn default_max_body() -> usize {
    1_048_576
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            webhook_verification: false,
            bind: default_bind(),
            port: default_port(),
            auth_path: default_auth_path(),
            webhook_path: default_webhook_path(),
            max_body_size: default_max_body(),
            handler_timeout_secs: None,
            timestamp_tolerance_secs: None,
        }
    }
}

impl GateConfig {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`GateError::Config`] when the settings cannot work together.
    pub fn validate(&self) -> Result<(), GateError> {
        let has_secret = self.signing_secret.as_ref().is_some_and(|s| !s.is_empty());
        if self.webhook_verification && !has_secret {
            return Err(GateError::Config(
                "webhook_verification requires a signing_secret".into(),
            ));
        }
        if !self.auth_path.starts_with('/') || !self.webhook_path.starts_with('/') {
            return Err(GateError::Config("route paths must start with '/'".into()));
        }
        if self.auth_path == self.webhook_path {
            return Err(GateError::Config(
                "auth_path and webhook_path must differ".into(),
            ));
        }
        if self.max_body_size == 0 {
            return Err(GateError::Config("max_body_size must be positive".into()));
        }
        Ok(())
    }

    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LANCER_SIGNING_SECRET") {
            self.signing_secret = Some(Secret::new(v));
        }
        if let Ok(v) = std::env::var("LANCER_WEBHOOK_VERIFICATION") {
            if let Ok(enabled) = v.parse::<bool>() {
                self.webhook_verification = enabled;
            } else {
                tracing::warn!("ignoring invalid LANCER_WEBHOOK_VERIFICATION value: {v}");
            }
        }
        if let Ok(v) = std::env::var("LANCER_BIND") {
            self.bind = v;
        }
        if let Ok(v) = std::env::var("LANCER_PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.port = port;
            } else {
                tracing::warn!("ignoring invalid LANCER_PORT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("LANCER_MAX_BODY_SIZE") {
            if let Ok(bytes) = v.parse::<usize>() {
                self.max_body_size = bytes;
            } else {
                tracing::warn!("ignoring invalid LANCER_MAX_BODY_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("LANCER_HANDLER_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.handler_timeout_secs = Some(secs);
            } else {
                tracing::warn!("ignoring invalid LANCER_HANDLER_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("LANCER_TIMESTAMP_TOLERANCE") {
            if let Ok(secs) = v.parse::<u64>() {
                self.timestamp_tolerance_secs = Some(secs);
            } else {
                tracing::warn!("ignoring invalid LANCER_TIMESTAMP_TOLERANCE value: {v}");
            }
        }
    }
}
