//! Named collection of authentication modules

use crate::authentication::rest::RestAuthenticationModuleBuilder;
use crate::authentication::{AuthType, AuthenticationModule, RestAuthenticationModule};
use crate::config::ClientConfig;
use crate::error::{PipeError, Result};
use crate::http::HttpTransport;
use crate::logging::Logger;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;

/// Thread-safe name → module map; `add` overwrites, `remove` is idempotent
#[derive(Clone, Default)]
pub struct Authenticator {
    modules: Arc<RwLock<HashMap<String, Arc<dyn AuthenticationModule>>>>,
    logger: Logger,
}

impl Authenticator {
    pub fn new(logger: Logger) -> Self {
        Self {
            modules: Arc::default(),
            logger,
        }
    }

    /// Store `module` under `name` and hand it back
    pub fn add(
        &self,
        name: impl Into<String>,
        module: Arc<dyn AuthenticationModule>,
    ) -> Arc<dyn AuthenticationModule> {
        let name = name.into();
        self.logger
            .debug(&format!("Registering authentication module '{}'", name));

        let mut modules = self.modules.write().unwrap_or_else(PoisonError::into_inner);
        if modules.insert(name.clone(), module.clone()).is_some() {
            self.logger
                .verbose(&format!("Replaced authentication module '{}'", name));
        }
        module
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AuthenticationModule>> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn AuthenticationModule>> {
        self.modules
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a builder for a module of `kind` against `base_url`.
    ///
    /// Only [`AuthType::Rest`] is implemented; other kinds fail with
    /// [`PipeError::UnsupportedConfiguration`].
    pub fn auth(&self, kind: AuthType, base_url: impl Into<String>) -> Result<AddAuthBuilder> {
        match kind {
            AuthType::Rest => Ok(AddAuthBuilder {
                registry: self.clone(),
                builder: RestAuthenticationModuleBuilder::new()
                    .base_url(base_url)
                    .logger(self.logger.clone()),
            }),
            AuthType::Other(name) => Err(PipeError::UnsupportedConfiguration(format!(
                "Unsupported authentication type: {}",
                name
            ))),
        }
    }
}

/// REST module builder whose terminal step registers the module
pub struct AddAuthBuilder {
    registry: Authenticator,
    builder: RestAuthenticationModuleBuilder,
}

impl AddAuthBuilder {
    pub fn login_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.builder = self.builder.login_endpoint(endpoint);
        self
    }

    pub fn logout_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.builder = self.builder.logout_endpoint(endpoint);
        self
    }

    pub fn enroll_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.builder = self.builder.enroll_endpoint(endpoint);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.builder = self.builder.config(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.builder = self.builder.transport(transport);
        self
    }

    pub fn runtime(mut self, handle: Handle) -> Self {
        self.builder = self.builder.runtime(handle);
        self
    }

    /// Build without registering
    pub fn build(&self) -> Result<RestAuthenticationModule> {
        self.builder.build()
    }

    /// Build, then register under `name`. Nothing is registered if the build fails.
    pub fn add(self, name: impl Into<String>) -> Result<Arc<RestAuthenticationModule>> {
        let module = Arc::new(self.builder.build()?);
        self.registry.add(name, module.clone());
        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(base_url: &str) -> Arc<dyn AuthenticationModule> {
        Arc::new(
            RestAuthenticationModule::builder()
                .base_url(base_url)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_add_then_get_returns_same_module() {
        let registry = Authenticator::default();
        let m = module("http://localhost:8080");

        let stored = registry.add("x", m.clone());
        assert!(Arc::ptr_eq(&stored, &m));
        assert!(Arc::ptr_eq(&registry.get("x").unwrap(), &m));
    }

    #[test]
    fn test_add_overwrites_silently() {
        let registry = Authenticator::default();
        registry.add("x", module("http://first:8080"));
        registry.add("x", module("http://second:8080"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("x").unwrap().base_url(), "http://second:8080");
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = Authenticator::default();
        registry.add("x", module("http://localhost:8080"));

        assert!(registry.remove("x").is_some());
        assert!(registry.get("x").is_none());
        assert!(registry.remove("x").is_none());
        assert!(registry.remove("never-added").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_builder_registers_under_name() {
        let registry = Authenticator::default();
        let built = registry
            .auth(AuthType::Rest, "http://localhost:8080/todo-server")
            .unwrap()
            .login_endpoint("/login")
            .add("todo")
            .unwrap();

        assert_eq!(built.login_url(), "http://localhost:8080/todo-server/login");
        assert_eq!(registry.names(), vec!["todo".to_string()]);
        assert_eq!(
            registry.get("todo").unwrap().login_endpoint(),
            "/login"
        );
    }

    #[test]
    fn test_failed_build_registers_nothing() {
        let registry = Authenticator::default();
        let result = registry
            .auth(AuthType::Rest, "not a url")
            .unwrap()
            .add("broken");

        assert!(matches!(result, Err(PipeError::InvalidConfiguration(_))));
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn test_unsupported_auth_type() {
        let registry = Authenticator::default();
        let result = registry.auth(AuthType::Other("oauth2".to_string()), "http://localhost");
        assert!(matches!(result, Err(PipeError::UnsupportedConfiguration(_))));
    }

    #[test]
    fn test_concurrent_add_get_remove() {
        let registry = Authenticator::default();
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    let name = format!("module-{}", i % 4);
                    registry.add(name.clone(), module("http://localhost:8080"));
                    let _ = registry.get(&name);
                    if i % 2 == 0 {
                        registry.remove(&name);
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.len() <= 4);
    }
}
