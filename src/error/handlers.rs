//! Standardized mapping from HTTP failure responses to [`PipeError`]

use crate::error::PipeError;
use reqwest::StatusCode;

/// Standard error handler for HTTP responses
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Handle a failed CRUD exchange on a pipe
    pub fn handle_pipe_error(status: StatusCode, error_text: &str, operation: &str) -> PipeError {
        let message = match status.as_u16() {
            400 => format!("Bad request during {}: {}", operation, error_text),
            401 => format!("Unauthorized to perform {}: {}", operation, error_text),
            403 => format!("Forbidden: insufficient permissions for {}: {}", operation, error_text),
            404 => format!("Resource not found for {}: {}", operation, error_text),
            409 => format!("Conflict during {}: {}", operation, error_text),
            429 => format!("Rate limited during {}: {}", operation, error_text),
            500 => format!("Server error during {}: {}", operation, error_text),
            502 | 503 => format!("Server unavailable for {}: {}", operation, error_text),
            _ => format!("{} failed (status {}): {}", operation, status, error_text),
        };

        Self::http_error(status, message, error_text)
    }

    /// Handle authentication-related HTTP errors
    pub fn handle_auth_error(status: StatusCode, error_text: &str, operation: &str) -> PipeError {
        let message = match status.as_u16() {
            400 => format!("Invalid {} request: {}", operation, error_text),
            401 => "Invalid credentials provided".to_string(),
            403 => "Access denied - insufficient permissions".to_string(),
            404 => format!("{} endpoint not found", operation),
            409 => format!("Account already exists: {}", error_text),
            _ => format!("{} failed (status {}): {}", operation, status, error_text),
        };

        Self::http_error(status, message, error_text)
    }

    fn http_error(status: StatusCode, message: String, error_text: &str) -> PipeError {
        PipeError::Http {
            status: status.as_u16(),
            message,
            body: error_text.to_string(),
        }
    }
}
