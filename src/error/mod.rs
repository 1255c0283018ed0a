//! Error types shared by pipes, authentication modules and stores
//!
//! Configuration and unsupported-operation errors are returned synchronously at
//! the call site. Everything that depends on I/O reaches the caller only through
//! the failure branch of a [`Callback`](crate::common::Callback).

pub mod handlers;

pub type Result<T> = std::result::Result<T, PipeError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum PipeError {
    /// A URL or other setting could not be composed at build time
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An adapter, store or authentication kind that has no implementation
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// An operation the adapter does not back
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The remote endpoint answered with a non-success status
    #[error("HTTP error (status {status}): {message}")]
    Http {
        status: u16,
        message: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Background work ended without producing an outcome (panic, dropped runtime)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipeError {
    /// Status code of the failed exchange, if the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PipeError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == Some(401)
    }

    /// Raw response body for HTTP failures
    pub fn body(&self) -> Option<&str> {
        match self {
            PipeError::Http { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for PipeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PipeError::Timeout(err.to_string())
        } else if err.is_decode() {
            PipeError::Parse(err.to_string())
        } else {
            PipeError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PipeError {
    fn from(err: serde_json::Error) -> Self {
        PipeError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for PipeError {
    fn from(err: url::ParseError) -> Self {
        PipeError::InvalidConfiguration(format!("Malformed URL: {}", err))
    }
}

impl From<std::io::Error> for PipeError {
    fn from(err: std::io::Error) -> Self {
        PipeError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_only_for_http_errors() {
        let err = PipeError::Http {
            status: 401,
            message: "Unauthorized".to_string(),
            body: "Unauthorized".to_string(),
        };
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_unauthorized());
        assert_eq!(err.body(), Some("Unauthorized"));

        let err = PipeError::Network("connection refused".to_string());
        assert_eq!(err.status_code(), None);
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_url_parse_error_is_invalid_configuration() {
        let err: PipeError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, PipeError::InvalidConfiguration(_)));
    }
}
