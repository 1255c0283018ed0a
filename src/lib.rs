//! Asynchronous CRUD pipes with pluggable authentication
//!
//! This file serves as the library root, organizing and exposing the modules that
//! make up the data-access layer: pipes over REST resources, the authentication
//! modules whose tokens they attach, and the callback machinery both report through.

pub mod authentication;
pub mod cli;
pub mod common;
pub mod config;
pub mod datamanager;
pub mod error;
pub mod factory;
pub mod http;
pub mod logging;
pub mod pipeline;

pub use authentication::{AuthType, AuthenticationModule, Authenticator, RestAuthenticationModule, Session};
pub use common::{BoxCallback, Callback, Completion, Dispatcher, OperationHandle, channel};
pub use config::{ClientConfig, ConfigOverrides};
pub use error::{PipeError, Result};
pub use http::{AUTH_TOKEN_HEADER, HeaderAndBody, HttpTransport};
pub use logging::Logger;
pub use pipeline::{Pipe, PipeConfig, PipeType, Pipeline, RestAdapter};
