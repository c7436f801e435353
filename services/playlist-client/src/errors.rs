//!
//! src/errors.rs
//!
//! Defines the client error enum and conversions from the
//! errors of the libraries the client calls into
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Non-2xx response, displays as the response body alone
    #[error("{body}")]
    RequestFailed { status: u16, body: String },
    #[error("http error: {0}")]
    Http(String),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("Enter a playlist name.")]
    MissingName,
    #[error("Playlist, title, and artist are required.")]
    MissingRequiredField,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self { ClientError::Http(e.to_string()) }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self { ClientError::Parse(e.to_string()) }
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self { ClientError::Config(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_failed_displays_body_only() {
        let e = ClientError::RequestFailed {
            status: 404,
            body: "{\"detail\":\"Playlist not found\"}".to_string()
        };
        assert_eq!(e.to_string(), "{\"detail\":\"Playlist not found\"}");
    }

    #[test]
    fn validation_errors_display_alert_text() {
        assert_eq!(ClientError::MissingName.to_string(), "Enter a playlist name.");
        assert_eq!(
            ClientError::MissingRequiredField.to_string(),
            "Playlist, title, and artist are required."
        );
    }
}
