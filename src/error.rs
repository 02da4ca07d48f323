//! Error types for mftracker_rs
//!
//! This module defines domain-specific error types that provide clear,
//! actionable error messages to users.

use thiserror::Error;

/// Failures of a single call to the fund API.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The server answered with a non-success status. `message` is the
    /// `error` field of the JSON body when the server supplied one.
    #[error("{}", request_failure_text(.status, .message))]
    RequestFailure {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

fn request_failure_text(status: &Option<u16>, message: &Option<String>) -> String {
    match (status, message) {
        (_, Some(message)) => message.clone(),
        (Some(status), None) => format!("Request failed with status {status}"),
        (None, None) => "Request failed".to_string(),
    }
}

impl GatewayError {
    /// The message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            GatewayError::RequestFailure { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text for the user: the server's own message when present, otherwise
    /// the caller's generic fallback.
    pub fn describe(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// Validation errors for the holding form in the TUI.
///
/// These errors are shown directly to users and should be clear and actionable.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Fund code is required")]
    FundCodeRequired,

    #[error("Fund name is required")]
    FundNameRequired,

    #[error("Units are required")]
    UnitsRequired,

    #[error("Invalid units format: {0}")]
    InvalidUnits(String),

    #[error("Units must be positive, got {0}")]
    NonPositiveUnits(f64),

    #[error("NAV at purchase is required")]
    NavRequired,

    #[error("Invalid NAV format: {0}")]
    InvalidNav(String),

    #[error("NAV must be positive, got {0}")]
    NonPositiveNav(f64),

    #[error("Purchase date is required")]
    DateRequired,

    #[error("Invalid purchase date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("No view at path '{0}'")]
    NotFound(String),
}

/// Failures of portfolio mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No holding with id {0}")]
    UnknownHolding(i64),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
