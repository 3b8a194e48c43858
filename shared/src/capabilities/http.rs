use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{AppError, ErrorKind, BRANCHES_PATH, CARS_PATH};

pub const MAX_URL_LENGTH: usize = 2048;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("URL '{url}' cannot carry path segments")]
    CannotBeABase { url: String },
}

impl From<EndpointError> for AppError {
    fn from(e: EndpointError) -> Self {
        AppError::new(ErrorKind::Configuration, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, EndpointError> {
        let url = url.into();
        let parsed = Self::validate(&url)?;
        Ok(Self {
            url: parsed.to_string(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    fn validate(url: &str) -> Result<Url, EndpointError> {
        if url.trim().is_empty() {
            return Err(EndpointError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(EndpointError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(url).map_err(|e| EndpointError::InvalidUrl {
            url: Self::truncate_url(url),
            reason: e.to_string(),
        })?;

        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(EndpointError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        if parsed.host_str().is_none() {
            return Err(EndpointError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "URL must have a host".to_string(),
            });
        }

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(EndpointError::InvalidUrl {
                url: Self::truncate_url(url),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(parsed)
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

/// Absolute URLs of the car API, rooted at the configured base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base: Url,
}

impl ApiEndpoints {
    pub fn new(base_url: &str) -> Result<Self, EndpointError> {
        let validated = ValidatedUrl::new(base_url)?;
        let base = Url::parse(validated.as_str()).map_err(|e| EndpointError::InvalidUrl {
            url: validated.as_str().to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(EndpointError::CannotBeABase {
                url: base.to_string(),
            });
        }
        Ok(Self { base })
    }

    /// `GET` and `PUT` target for a single car.
    pub fn car(&self, car_id: &str) -> Result<String, EndpointError> {
        self.join(&[CARS_PATH, car_id])
    }

    pub fn branches(&self) -> Result<String, EndpointError> {
        self.join(&[BRANCHES_PATH])
    }

    fn join(&self, segments: &[&str]) -> Result<String, EndpointError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| EndpointError::CannotBeABase {
                url: self.base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}
