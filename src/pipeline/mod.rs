//! Pipes: asynchronous CRUD over one remote resource
//!
//! A [`Pipe`] never blocks its caller. Each operation is dispatched to the runtime
//! and reports through its callback. When an authenticated module is attached, its
//! token travels in the `Auth-Token` header of every request the pipe sends.

pub mod manager;
pub mod rest_adapter;

pub use manager::{PipeConfig, Pipeline};
pub use rest_adapter::RestAdapter;

use crate::authentication::AuthenticationModule;
use crate::common::{BoxCallback, Dispatcher, OperationHandle};
use crate::error::{PipeError, Result};
use crate::http::HttpTransport;
use crate::logging::Logger;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Transport kind of a pipe
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PipeType {
    #[default]
    Rest,
    Other(String),
}

impl fmt::Display for PipeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeType::Rest => write!(f, "REST"),
            PipeType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for PipeType {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PipeError::Validation("Pipe type cannot be empty".to_string()));
        }
        if trimmed.eq_ignore_ascii_case("rest") {
            Ok(PipeType::Rest)
        } else {
            Ok(PipeType::Other(trimmed.to_string()))
        }
    }
}

/// Asynchronous CRUD contract for elements of type `T`
pub trait Pipe<T>: Send + Sync {
    fn pipe_type(&self) -> PipeType;

    /// Endpoint this pipe reads from and writes to
    fn url(&self) -> &Url;

    /// Fetch the whole collection
    fn read(&self, callback: BoxCallback<Vec<T>>) -> Result<OperationHandle>;

    /// Create or update one element, receiving the server's representation
    fn save(&self, item: T, callback: BoxCallback<T>) -> Result<OperationHandle>;

    fn remove(&self, id: &str, callback: BoxCallback<()>) -> Result<OperationHandle>;

    /// Attach or replace the module consulted before every request.
    ///
    /// The module should already be logged in; attaching never triggers a login.
    fn set_authentication_module(&self, module: Arc<dyn AuthenticationModule>);

    fn authentication_module(&self) -> Option<Arc<dyn AuthenticationModule>>;
}

/// What every pipe created by a [`Pipeline`] or the factory shares
#[derive(Clone)]
pub struct PipeContext {
    pub transport: Arc<dyn HttpTransport>,
    pub dispatcher: Dispatcher,
    pub logger: Logger,
}

impl PipeContext {
    pub fn new(transport: Arc<dyn HttpTransport>, dispatcher: Dispatcher, logger: Logger) -> Self {
        Self {
            transport,
            dispatcher,
            logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_type_parsing() {
        assert_eq!("rest".parse::<PipeType>().unwrap(), PipeType::Rest);
        assert_eq!(
            "websocket".parse::<PipeType>().unwrap(),
            PipeType::Other("websocket".to_string())
        );
        assert_eq!(PipeType::default().to_string(), "REST");
    }
}
