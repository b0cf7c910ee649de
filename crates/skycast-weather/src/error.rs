//! Weather SDK error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error when calling weather API: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered 404 for the requested city.
    #[error("{message}")]
    NotFound { message: String, body: String },

    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Failed to parse weather API response: {0}")]
    Parsing(String),

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl WeatherError {
    /// Build the error for a non-success upstream status.
    ///
    /// `upstream_message` is the `message` field of the error body, if any.
    pub(crate) fn from_status(status: u16, upstream_message: Option<String>, body: String) -> Self {
        let mut message = format!("Weather API returned status {}", status);
        if let Some(m) = upstream_message {
            message.push_str(": ");
            message.push_str(&m);
        }

        if status == 404 {
            Self::NotFound { message, body }
        } else {
            Self::Api {
                status,
                message,
                body,
            }
        }
    }

    /// HTTP status for upstream errors; `NotFound` is always 404.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream error body.
    pub fn error_body(&self) -> Option<&str> {
        match self {
            Self::NotFound { body, .. } | Self::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether trying the same request again later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Network(_) => "Network error. Check your connection.".to_string(),
            Self::NotFound { .. } => "City not found".to_string(),
            Self::Api { status: 401, .. } => "Invalid API key".to_string(),
            Self::Api { status: 429, .. } => "Too many requests. Please try again later.".to_string(),
            Self::Api { status, .. } if *status >= 500 => {
                "The weather service is experiencing issues. Please try again later.".to_string()
            }
            Self::Api { .. } => "The weather request failed".to_string(),
            Self::Parsing(_) => "Received an unexpected response from the weather service".to_string(),
            Self::AlreadyExists(_) => "A client for this API key already exists".to_string(),
            Self::Runtime(_) => "Weather service is not running".to_string(),
        }
    }
}
