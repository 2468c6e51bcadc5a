use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("Unknown exchange: {0}")]
    UnknownExchange(String),

    #[error("Unknown endpoint: {endpoint}")]
    UnknownEndpoint { endpoint: String },

    #[error("Unknown action '{action}' for endpoint '{endpoint}'")]
    UnknownAction { endpoint: String, action: String },

    #[error("Endpoint '{endpoint}' requires an action")]
    ActionRequired { endpoint: String },

    #[error("Endpoint '{endpoint}' does not accept an action (got '{action}')")]
    ActionNotAllowed { endpoint: String, action: String },

    #[error("Unknown instrument: {instrument}")]
    UnknownInstrument { instrument: String },

    #[error("Invalid argument '{field}': {message}")]
    InvalidArgument { field: String, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse { endpoint: String, reason: String },

    #[error("API error from {endpoint}: {}", messages.join(", "))]
    ApiError {
        endpoint: String,
        messages: Vec<String>,
    },

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    pub(crate) fn invalid_argument(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn malformed(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}
