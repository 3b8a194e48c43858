// lib.rs - Edit-car form core

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod app;
pub mod capabilities;
pub mod config;
pub mod event;
pub mod model;
pub mod multipart;
pub mod validation;
pub mod view;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use config::{ConfigError, EditorConfig};
pub use crux_core::{render::Render, App as CruxApp};
pub use event::{Event, Generation};
pub use model::{
    Branch, CarField, CarForm, CarRecord, CarStatus, Identifier, ImageFile, Model,
    SessionContext, ValidationErrors,
};
pub use view::{FormFieldsView, SelectOption, UserFacingError, ViewModel};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
pub const CAR_LISTING_PATH: &str = "/branch-manager/cars";
pub const REDIRECT_DELAY_MS: u64 = 1000;
pub const CARS_PATH: &str = "cars";
pub const BRANCHES_PATH: &str = "branches";
pub const IMAGE_PART: &str = "image";
pub const CAR_DTO_PART: &str = "carDto";
pub const SUCCESS_MESSAGE: &str = "Car updated successfully!";
pub const SUCCESS_DETAIL: &str = "You can now view it in the cars list.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Conflict,
    RateLimited,
    PayloadTooLarge,
    Configuration,
    Serialization,
    Deserialization,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RateLimited => "RATE_LIMITED",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Conflict | Self::RateLimited => {
                ErrorSeverity::Transient
            }

            Self::Configuration
            | Self::Serialization
            | Self::Deserialization
            | Self::Internal => ErrorSeverity::Fatal,

            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::PayloadTooLarge
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::RateLimited | Self::Conflict
        )
    }
}

/// Error carried in the model and rendered through [`UserFacingError`].
///
/// Load and submit failures never abort the form; they are kept here until the
/// user dismisses them or retries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Authentication => {
                "Your session has expired. Please sign in again.".into()
            }
            ErrorKind::Authorization => {
                "You don't have permission to edit this car.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The car could not be found.".into(),
            ErrorKind::Conflict => {
                "This car was changed by someone else. Please reload and try again.".into()
            }
            ErrorKind::RateLimited => "Too many requests. Please wait a moment and try again.".into(),
            ErrorKind::PayloadTooLarge => {
                "The selected image is too large. Please choose a smaller file.".into()
            }
            ErrorKind::Configuration => {
                "The app is misconfigured. Please contact support.".into()
            }
            ErrorKind::Serialization | ErrorKind::Deserialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again or contact support.".into()
            }
        }
    }

    #[must_use]
    pub fn from_http_status(status: u16, body: Option<&[u8]>) -> Self {
        let kind = match status {
            400 | 422 => ErrorKind::Validation,
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            404 => ErrorKind::NotFound,
            408 => ErrorKind::Timeout,
            409 => ErrorKind::Conflict,
            413 => ErrorKind::PayloadTooLarge,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Internal,
            _ => ErrorKind::Unknown,
        };

        let message = body
            .and_then(|b| serde_json::from_slice::<ApiErrorResponse>(b).ok())
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP error: {status}"));

        Self::new(kind, message).with_context("http_status", status.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<crux_http::HttpError> for AppError {
    fn from(e: crux_http::HttpError) -> Self {
        match e {
            crux_http::HttpError::Http { code, message, body } => {
                let status: u16 = code.into();
                Self::from_http_status(status, body.as_deref()).with_internal(message)
            }
            crux_http::HttpError::Timeout => {
                Self::new(ErrorKind::Timeout, "request timed out")
            }
            crux_http::HttpError::Json(reason) => {
                Self::new(ErrorKind::Deserialization, "response body could not be decoded")
                    .with_internal(reason)
            }
            crux_http::HttpError::Url(reason) => {
                Self::new(ErrorKind::Configuration, "request URL is invalid").with_internal(reason)
            }
            crux_http::HttpError::Io(reason) => Self::new(ErrorKind::Network, reason),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: String,
}

pub type AppResult<T> = Result<T, AppError>;
