//! Error handling and custom error types
//!
//! Provides unified error handling across the relay using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Caller input is missing or malformed. Never retried.
    #[error("{0}")]
    Validation(String),

    /// The remote API could not be reached or answered with a non-2xx status.
    #[error("{}", upstream_transport_message(.status))]
    UpstreamTransport { status: Option<u16>, body: String },

    #[error("Unexpected response from generation API: {0}")]
    UpstreamFormat(String),

    /// The call succeeded but the model produced nothing usable.
    #[error("Nothing was generated")]
    EmptyResult,

    /// Local setup failed before any request was sent.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

fn upstream_transport_message(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!("API request failed: {}", status),
        None => "API request failed: no response".to_string(),
    }
}

impl Error {
    /// Raw diagnostic payload attached to upstream failures, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            Error::UpstreamTransport { body, .. } if !body.is_empty() => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::UpstreamTransport {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_transport_message_includes_status() {
        let err = Error::UpstreamTransport {
            status: Some(429),
            body: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API request failed: 429");
        assert_eq!(err.details(), Some("quota exceeded"));
    }

    #[test]
    fn test_upstream_transport_without_status() {
        let err = Error::UpstreamTransport {
            status: None,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "API request failed: no response");
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_config_error_is_not_an_upstream_failure() {
        let err = Error::Config("TLS backend unavailable".to_string());
        assert_eq!(err.to_string(), "Configuration error: TLS backend unavailable");
        assert_eq!(err.details(), None);
    }

    #[test]
    fn test_empty_result_is_distinct_from_format_error() {
        assert_eq!(Error::EmptyResult.to_string(), "Nothing was generated");
        assert!(Error::UpstreamFormat("bad".to_string())
            .to_string()
            .contains("bad"));
    }
}
