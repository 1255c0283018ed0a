//! Authentication modules and the registry that names them
//!
//! An [`AuthenticationModule`] holds one session against one backend. Pipes only
//! read its [`credential`](AuthenticationModule::credential); the session itself is
//! changed exclusively by the module's own login, logout and enroll.

pub mod registry;
pub mod rest;

pub use registry::{AddAuthBuilder, Authenticator};
pub use rest::{RestAuthenticationModule, RestAuthenticationModuleBuilder};

use crate::common::{BoxCallback, OperationHandle};
use crate::error::{PipeError, Result};
use crate::http::HeaderAndBody;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kind of authentication module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthType {
    Rest,
    /// A kind named by the caller that has no implementation yet
    Other(String),
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthType::Rest => write!(f, "REST"),
            AuthType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for AuthType {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PipeError::Validation(
                "Authentication type cannot be empty".to_string(),
            ));
        }
        if trimmed.eq_ignore_ascii_case("rest") {
            Ok(AuthType::Rest)
        } else {
            Ok(AuthType::Other(trimmed.to_string()))
        }
    }
}

/// Snapshot of a module's session, read or replaced as one value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: String,
    authenticated: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn authenticated(token: String) -> Self {
        Self {
            token,
            authenticated: true,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Token to attach to outgoing requests, if any
    pub fn credential(&self) -> Option<&str> {
        if self.authenticated && !self.token.is_empty() {
            Some(&self.token)
        } else {
            None
        }
    }
}

/// A session against one backend
pub trait AuthenticationModule: Send + Sync {
    fn base_url(&self) -> &str;

    fn login_endpoint(&self) -> &str;

    fn logout_endpoint(&self) -> &str;

    fn enroll_endpoint(&self) -> &str;

    /// Consistent view of token and flag
    fn session(&self) -> Session;

    fn auth_token(&self) -> String {
        self.session().token
    }

    fn is_authenticated(&self) -> bool {
        self.session().authenticated
    }

    /// Token to inject into a request, present only while authenticated
    fn credential(&self) -> Option<String> {
        self.session().credential().map(str::to_string)
    }

    fn login(
        &self,
        username: &str,
        password: &str,
        callback: BoxCallback<HeaderAndBody>,
    ) -> Result<OperationHandle>;

    fn logout(&self, _callback: BoxCallback<()>) -> Result<OperationHandle> {
        Err(PipeError::UnsupportedOperation(
            "logout is not implemented by this authentication module".to_string(),
        ))
    }

    fn enroll(
        &self,
        _user_data: HashMap<String, String>,
        _callback: BoxCallback<HeaderAndBody>,
    ) -> Result<OperationHandle> {
        Err(PipeError::UnsupportedOperation(
            "enroll is not implemented by this authentication module".to_string(),
        ))
    }
}
