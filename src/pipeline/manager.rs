//! Named pipes sharing one base URL and one transport

use crate::authentication::AuthenticationModule;
use crate::common::Dispatcher;
use crate::config::ClientConfig;
use crate::error::{PipeError, Result};
use crate::factory::AdapterFactory;
use crate::http::{HttpRestProvider, HttpTransport};
use crate::logging::Logger;
use crate::pipeline::rest_adapter::DEFAULT_RECORD_ID;
use crate::pipeline::{Pipe, PipeContext, PipeType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::runtime::Handle;
use url::Url;

/// Settings for one pipe created through a [`Pipeline`]
#[derive(Clone)]
pub struct PipeConfig {
    pub name: String,
    /// Path relative to the pipeline's base URL; defaults to the name
    pub endpoint: Option<String>,
    pub pipe_type: PipeType,
    pub record_id: String,
    pub auth_module: Option<Arc<dyn AuthenticationModule>>,
}

impl PipeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: None,
            pipe_type: PipeType::Rest,
            record_id: DEFAULT_RECORD_ID.to_string(),
            auth_module: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_type(mut self, pipe_type: PipeType) -> Self {
        self.pipe_type = pipe_type;
        self
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = record_id.into();
        self
    }

    pub fn with_auth_module(mut self, module: Arc<dyn AuthenticationModule>) -> Self {
        self.auth_module = Some(module);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PipeError::Validation("Pipe name cannot be empty".to_string()));
        }
        if self.record_id.trim().is_empty() {
            return Err(PipeError::Validation(
                "Record id field cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Collection of pipes under one base URL
///
/// Pipes are stored type-erased; [`get`](Pipeline::get) hands one back only when
/// asked for the element type it was created with.
pub struct Pipeline {
    base_url: Url,
    context: PipeContext,
    pipes: RwLock<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl Pipeline {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, &ClientConfig::default(), Logger::default())
    }

    pub fn with_config(base_url: &str, config: &ClientConfig, logger: Logger) -> Result<Self> {
        let transport = Arc::new(HttpRestProvider::from_config(config, logger.clone())?);
        Self::with_transport(base_url, transport, logger)
    }

    pub fn with_transport(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        logger: Logger,
    ) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(PipeError::InvalidConfiguration(format!(
                "'{}' cannot be used as a base URL",
                base_url
            )));
        }

        let dispatcher = Dispatcher::default().with_logger(logger.clone());
        Ok(Self {
            base_url,
            context: PipeContext::new(transport, dispatcher, logger),
            pipes: RwLock::new(HashMap::new()),
        })
    }

    /// Run every pipe's operations on `handle` instead of the caller's runtime
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.context.dispatcher = Dispatcher::new(handle).with_logger(self.context.logger.clone());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create a pipe for `T` and register it under the config's name
    pub fn pipe<T>(&self, config: PipeConfig) -> Result<Arc<dyn Pipe<T>>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        config.validate()?;

        let endpoint = config.endpoint.as_deref().unwrap_or(&config.name);
        let url = self.endpoint_url(endpoint);
        let pipe = AdapterFactory::create_pipe::<T>(&config, url, &self.context)?;

        self.context.logger.verbose(&format!(
            "Created {} pipe '{}' at {}",
            config.pipe_type,
            config.name,
            pipe.url()
        ));

        self.pipes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(config.name.clone(), Box::new(pipe.clone()));

        Ok(pipe)
    }

    /// Pipe registered under `name`, if it was created for element type `T`
    pub fn get<T: 'static>(&self, name: &str) -> Option<Arc<dyn Pipe<T>>> {
        self.pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)?
            .downcast_ref::<Arc<dyn Pipe<T>>>()
            .cloned()
    }

    pub fn remove(&self, name: &str) -> bool {
        self.pipes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pipes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn endpoint_url(&self, endpoint: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(endpoint.split('/').filter(|segment| !segment.is_empty()));
        }
        url
    }
}
