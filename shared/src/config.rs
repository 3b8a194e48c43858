//! Shell-supplied settings for the edit form.
//!
//! The shell owns deployment details (which API host, where the car listing
//! lives). It sends them once as JSON through [`crate::Event::Configure`];
//! anything left out keeps its default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::http::{EndpointError, ValidatedUrl};
use crate::{AppError, ErrorKind, CAR_LISTING_PATH, DEFAULT_API_BASE_URL, REDIRECT_DELAY_MS};

pub const MAX_REDIRECT_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(String),

    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] EndpointError),

    #[error("listing path '{0}' must be absolute")]
    RelativeListingPath(String),

    #[error("redirect delay {value}ms exceeds maximum of {max}ms")]
    RedirectDelayTooLong { value: u64, max: u64 },
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub api_base_url: String,
    pub listing_path: String,
    pub redirect_delay_ms: u64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            listing_path: CAR_LISTING_PATH.to_string(),
            redirect_delay_ms: REDIRECT_DELAY_MS,
        }
    }
}

impl EditorConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ValidatedUrl::new(&self.api_base_url)?;

        if !self.listing_path.starts_with('/') {
            return Err(ConfigError::RelativeListingPath(self.listing_path.clone()));
        }

        if self.redirect_delay_ms > MAX_REDIRECT_DELAY_MS {
            return Err(ConfigError::RedirectDelayTooLong {
                value: self.redirect_delay_ms,
                max: MAX_REDIRECT_DELAY_MS,
            });
        }

        Ok(())
    }
}
