//! Error types for the shipping broker.

use thiserror::Error;

use crate::models::Provider;

/// Result type alias for broker operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or disabled credentials, caught at client construction.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input; no network call was attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// A carrier API answered with an HTTP error status.
    #[error("{provider} error {status}: {detail}")]
    Carrier {
        provider: Provider,
        status: u16,
        detail: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("PDF assembly error: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A purchase or label fetch ended without a printable label.
    #[error("no shipping label: {0}")]
    MissingLabel(String),

    #[error("label storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Build a carrier error from an HTTP error response, preferring the
    /// JSON error detail when the body parses.
    pub(crate) fn carrier(provider: Provider, status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let detail = match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(value) => value.to_string(),
            Err(_) if trimmed.is_empty() => "(empty)".to_string(),
            Err(_) => trimmed.to_string(),
        };
        Error::Carrier {
            provider,
            status,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_error_prefers_json_detail() {
        let err = Error::carrier(
            Provider::Ups,
            400,
            r#"{"response": {"errors": [{"code": "120100", "message": "Missing shipper number"}]}}"#,
        );
        let text = err.to_string();
        assert!(text.contains("UPS error 400"), "got: {text}");
        assert!(text.contains("Missing shipper number"));
    }

    #[test]
    fn carrier_error_falls_back_to_raw_text() {
        let err = Error::carrier(Provider::FedEx, 503, "Service Unavailable");
        assert_eq!(
            err.to_string(),
            "FedEx error 503: Service Unavailable"
        );
    }

    #[test]
    fn carrier_error_marks_empty_body() {
        let err = Error::carrier(Provider::EasyPost, 500, "  ");
        assert_eq!(err.to_string(), "EasyPost error 500: (empty)");
    }
}
