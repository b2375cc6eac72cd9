use thiserror::Error;

/// Errors raised while talking to an SMS provider.
///
/// Sending never returns these directly: [`crate::SmsTransport::send`]
/// folds them into a failed [`crate::SmsResult`]. They surface from
/// construction and from account queries.
#[derive(Debug, Error)]
pub enum SmsError {
    /// Request could not be sent or the response could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON shape the provider documents
    #[error("Invalid provider response: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered with a non-success HTTP status
    #[error("HTTP Error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Settings are missing or unusable
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for SMS operations
pub type Result<T> = std::result::Result<T, SmsError>;
