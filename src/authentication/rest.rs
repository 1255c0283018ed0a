//! REST authentication module
//!
//! Logs in, logs out and enrolls against `base_url + endpoint`. A successful login
//! or enroll stores the `Auth-Token` the server hands back; the stored session is
//! replaced as a whole so readers never see a token without its flag.

use crate::authentication::{AuthenticationModule, Session};
use crate::common::{BoxCallback, Dispatcher, OperationHandle};
use crate::config::ClientConfig;
use crate::error::handlers::HttpErrorHandler;
use crate::error::{PipeError, Result};
use crate::http::{AUTH_TOKEN_HEADER, HeaderAndBody, HttpRestProvider, HttpTransport, RequestHeaders};
use crate::logging::Logger;
use reqwest::StatusCode;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:80";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "/auth/login";
pub const DEFAULT_LOGOUT_ENDPOINT: &str = "/auth/logout";
pub const DEFAULT_ENROLL_ENDPOINT: &str = "/auth/enroll";

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

pub struct RestAuthenticationModule {
    base_url: String,
    login_endpoint: String,
    login_url: String,
    logout_endpoint: String,
    logout_url: String,
    enroll_endpoint: String,
    enroll_url: String,
    session: Arc<RwLock<Session>>,
    transport: Arc<dyn HttpTransport>,
    dispatcher: Dispatcher,
    logger: Logger,
}

impl std::fmt::Debug for RestAuthenticationModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAuthenticationModule")
            .field("base_url", &self.base_url)
            .field("login_url", &self.login_url)
            .field("logout_url", &self.logout_url)
            .field("enroll_url", &self.enroll_url)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl RestAuthenticationModule {
    pub fn builder() -> RestAuthenticationModuleBuilder {
        RestAuthenticationModuleBuilder::new()
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn logout_url(&self) -> &str {
        &self.logout_url
    }

    pub fn enroll_url(&self) -> &str {
        &self.enroll_url
    }

    /// Submit `body` to `url` and, on success, enter the authenticated state
    fn authenticate(
        &self,
        operation: &'static str,
        url: String,
        body: serde_json::Result<Vec<u8>>,
        callback: BoxCallback<HeaderAndBody>,
    ) -> Result<OperationHandle> {
        let transport = self.transport.clone();
        let session = self.session.clone();
        let logger = self.logger.clone();

        self.dispatcher.dispatch(
            operation,
            async move {
                let response = transport
                    .post(&url, body?, &RequestHeaders::new())
                    .await
                    .map_err(|e| remap_auth_error(e, operation))?;

                let token = response
                    .field(AUTH_TOKEN_HEADER)
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| {
                        PipeError::Parse(format!(
                            "{} response did not carry an {} field",
                            operation, AUTH_TOKEN_HEADER
                        ))
                    })?;

                logger.verbose(&format!(
                    "{} succeeded, token {}",
                    operation,
                    logger.redact(&token)
                ));
                store(&session, Session::authenticated(token));

                Ok::<_, PipeError>(response)
            },
            callback,
        )
    }
}

impl AuthenticationModule for RestAuthenticationModule {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn login_endpoint(&self) -> &str {
        &self.login_endpoint
    }

    fn logout_endpoint(&self) -> &str {
        &self.logout_endpoint
    }

    fn enroll_endpoint(&self) -> &str {
        &self.enroll_endpoint
    }

    fn session(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn login(
        &self,
        username: &str,
        password: &str,
        callback: BoxCallback<HeaderAndBody>,
    ) -> Result<OperationHandle> {
        self.logger
            .verbose(&format!("Attempting login for user: {}", username));

        let body = serde_json::to_vec(&LoginRequest { username, password });
        self.authenticate("login", self.login_url.clone(), body, callback)
    }

    fn logout(&self, callback: BoxCallback<()>) -> Result<OperationHandle> {
        let transport = self.transport.clone();
        let session = self.session.clone();
        let logger = self.logger.clone();
        let url = self.logout_url.clone();

        self.dispatcher.dispatch(
            "logout",
            async move {
                let mut headers = RequestHeaders::new();
                let current = session
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone();
                if let Some(token) = current.credential() {
                    headers.insert(AUTH_TOKEN_HEADER.to_string(), token.to_string());
                }

                transport
                    .post(&url, Vec::new(), &headers)
                    .await
                    .map_err(|e| remap_auth_error(e, "logout"))?;

                store(&session, Session::anonymous());
                logger.verbose("Logged out");

                Ok::<_, PipeError>(())
            },
            callback,
        )
    }

    fn enroll(
        &self,
        user_data: HashMap<String, String>,
        callback: BoxCallback<HeaderAndBody>,
    ) -> Result<OperationHandle> {
        self.logger.verbose(&format!(
            "Enrolling user: {}",
            user_data.get("username").map(String::as_str).unwrap_or("<unnamed>")
        ));

        let body = serde_json::to_vec(&user_data);
        self.authenticate("enroll", self.enroll_url.clone(), body, callback)
    }
}

fn store(session: &RwLock<Session>, next: Session) {
    *session.write().unwrap_or_else(PoisonError::into_inner) = next;
}

fn remap_auth_error(error: PipeError, operation: &str) -> PipeError {
    if let PipeError::Http { status, body, .. } = &error {
        if let Ok(status) = StatusCode::from_u16(*status) {
            return HttpErrorHandler::handle_auth_error(status, body, operation);
        }
    }
    error
}

/// Builder for [`RestAuthenticationModule`]
///
/// `build` resolves the three endpoint URLs by concatenating the base URL and each
/// endpoint path, failing with [`PipeError::InvalidConfiguration`] if any result is
/// not a valid URL.
#[derive(Clone)]
pub struct RestAuthenticationModuleBuilder {
    base_url: String,
    login_endpoint: String,
    logout_endpoint: String,
    enroll_endpoint: String,
    config: ClientConfig,
    transport: Option<Arc<dyn HttpTransport>>,
    dispatcher: Dispatcher,
    logger: Logger,
}

impl Default for RestAuthenticationModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RestAuthenticationModuleBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            login_endpoint: DEFAULT_LOGIN_ENDPOINT.to_string(),
            logout_endpoint: DEFAULT_LOGOUT_ENDPOINT.to_string(),
            enroll_endpoint: DEFAULT_ENROLL_ENDPOINT.to_string(),
            config: ClientConfig::default(),
            transport: None,
            dispatcher: Dispatcher::default(),
            logger: Logger::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.login_endpoint = endpoint.into();
        self
    }

    pub fn logout_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.logout_endpoint = endpoint.into();
        self
    }

    pub fn enroll_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.enroll_endpoint = endpoint.into();
        self
    }

    /// Transport settings; ignored when a transport is supplied directly
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Runtime that login/logout/enroll run on; defaults to the caller's runtime
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.dispatcher = Dispatcher::new(handle).with_logger(self.logger.clone());
        self
    }

    pub fn logger(mut self, logger: Logger) -> Self {
        self.dispatcher = self.dispatcher.with_logger(logger.clone());
        self.logger = logger;
        self
    }

    pub fn build(&self) -> Result<RestAuthenticationModule> {
        let login_url = resolve(&self.base_url, &self.login_endpoint)?;
        let logout_url = resolve(&self.base_url, &self.logout_endpoint)?;
        let enroll_url = resolve(&self.base_url, &self.enroll_endpoint)?;

        let transport = match &self.transport {
            Some(transport) => transport.clone(),
            None => Arc::new(HttpRestProvider::from_config(
                &self.config,
                self.logger.clone(),
            )?),
        };

        self.logger
            .debug(&format!("Built REST authentication module for {}", self.base_url));

        Ok(RestAuthenticationModule {
            base_url: self.base_url.clone(),
            login_endpoint: self.login_endpoint.clone(),
            login_url,
            logout_endpoint: self.logout_endpoint.clone(),
            logout_url,
            enroll_endpoint: self.enroll_endpoint.clone(),
            enroll_url,
            session: Arc::new(RwLock::new(Session::anonymous())),
            transport,
            dispatcher: self.dispatcher.clone(),
            logger: self.logger.clone(),
        })
    }
}

fn resolve(base_url: &str, endpoint: &str) -> Result<String> {
    let composed = format!("{}{}", base_url, endpoint);
    Url::parse(&composed).map_err(|e| {
        PipeError::InvalidConfiguration(format!("'{}' is not a valid URL: {}", composed, e))
    })?;
    Ok(composed)
}
