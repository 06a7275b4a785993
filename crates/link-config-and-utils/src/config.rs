//! Configuration management for the demo.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Public Identity Toolkit endpoint. Point it at an emulator to test locally.
pub const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Email of the fixed test account used for linking and reset.
pub const DEFAULT_TEST_EMAIL: &str = "me@example.com";

/// Password of the fixed test account.
pub const DEFAULT_TEST_PASSWORD: &str = "123456789";

/// Web API key baked in at compile time via the ANON_LINK_API_KEY env var.
const DEFAULT_API_KEY: Option<&str> = option_env!("ANON_LINK_API_KEY");

/// Which authentication backend the demo talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// In-process backend, no network.
    #[default]
    Memory,
    /// Identity Toolkit REST API (or its emulator).
    IdentityToolkit,
}

impl std::str::FromStr for ProviderKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "memory" => Ok(Self::Memory),
            "identity_toolkit" => Ok(Self::IdentityToolkit),
            other => Err(CoreError::Config(format!("Unknown provider: {}", other))),
        }
    }
}

/// Demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Authentication backend.
    #[serde(default)]
    pub provider: ProviderKind,
    /// Identity Toolkit base URL.
    #[serde(default = "default_identity_toolkit_url")]
    pub identity_toolkit_url: String,
    /// Identity Toolkit web API key.
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,
    /// Email of the test account.
    #[serde(default = "default_test_email")]
    pub test_email: String,
    /// Password of the test account.
    #[serde(default = "default_test_password")]
    pub test_password: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_identity_toolkit_url() -> String {
    DEFAULT_IDENTITY_TOOLKIT_URL.to_string()
}

fn default_api_key() -> Option<String> {
    DEFAULT_API_KEY.map(|s| s.to_string())
}

fn default_test_email() -> String {
    DEFAULT_TEST_EMAIL.to_string()
}

fn default_test_password() -> String {
    DEFAULT_TEST_PASSWORD.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            provider: ProviderKind::default(),
            identity_toolkit_url: default_identity_toolkit_url(),
            api_key: default_api_key(),
            test_email: default_test_email(),
            test_password: default_test_password(),
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "loading config file");
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(provider) = get("ANON_LINK_PROVIDER") {
            match provider.parse() {
                Ok(kind) => self.provider = kind,
                Err(e) => warn!(error = %e, "ignoring ANON_LINK_PROVIDER"),
            }
        }
        if let Some(log_level) = get("ANON_LINK_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(url) = get("ANON_LINK_AUTH_URL") {
            self.identity_toolkit_url = url.trim_end_matches('/').to_string();
        }
        if let Some(api_key) = get("ANON_LINK_API_KEY") {
            self.api_key = Some(api_key);
        }
    }

    /// Check that the values can actually be used.
    pub fn validate(&self) -> CoreResult<()> {
        self.identity_toolkit_url()?;

        if self.test_email.trim().is_empty() || self.test_password.is_empty() {
            return Err(CoreError::Config(
                "test_email and test_password must not be empty".to_string(),
            ));
        }

        if self.provider == ProviderKind::IdentityToolkit && self.api_key.is_none() {
            return Err(CoreError::Config(
                "identity_toolkit provider requires an api_key".to_string(),
            ));
        }

        Ok(())
    }

    /// Get the Identity Toolkit URL as a parsed URL.
    pub fn identity_toolkit_url(&self) -> CoreResult<Url> {
        Url::parse(&self.identity_toolkit_url).map_err(CoreError::from)
    }
}
