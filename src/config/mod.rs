#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, QueryArgs};
pub use toml_config::FileConfig;

use crate::adapters::http::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_range, validate_url, Validate};
use std::time::Duration;
use toml_config::{MAX_TIMEOUT_SECONDS, MIN_TIMEOUT_SECONDS};

/// Effective remote settings after layering defaults, file and flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Explicit values win over the file, the file wins over the defaults.
    pub fn resolve(
        file: Option<&FileConfig>,
        base_url: Option<&str>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self> {
        if let Some(file) = file {
            file.validate()?;
        }
        let remote = file.map(|f| &f.remote);
        let defaults = Settings::default();

        let base_url = base_url
            .map(str::to_string)
            .or_else(|| remote.and_then(|r| r.base_url.clone()))
            .unwrap_or(defaults.base_url);
        let timeout = timeout_seconds
            .or_else(|| remote.and_then(|r| r.timeout_seconds))
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let settings = Self { base_url, timeout };
        settings.validate()?;
        Ok(settings)
    }
}

impl ConfigProvider for Settings {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("base_url", &self.base_url)?;
        validate_range(
            "timeout_seconds",
            self.timeout.as_secs(),
            MIN_TIMEOUT_SECONDS,
            MAX_TIMEOUT_SECONDS,
        )
    }
}
