//! Selection of pipe and store implementations by type tag

use crate::datamanager::{IdGenerator, MemoryStorage, Store, StoreType};
use crate::error::{PipeError, Result};
use crate::pipeline::{Pipe, PipeConfig, PipeContext, PipeType, RestAdapter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

pub struct AdapterFactory;

impl AdapterFactory {
    /// Pipe for `config.pipe_type` at `url`, with the config's module attached
    pub fn create_pipe<T>(
        config: &PipeConfig,
        url: Url,
        context: &PipeContext,
    ) -> Result<Arc<dyn Pipe<T>>>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
    {
        let pipe: Arc<dyn Pipe<T>> = match &config.pipe_type {
            PipeType::Rest => Arc::new(
                RestAdapter::<T>::new(url, context.clone())?.with_record_id(&config.record_id),
            ),
            PipeType::Other(name) => {
                return Err(PipeError::UnsupportedConfiguration(format!(
                    "Pipe type '{}' is not supported yet",
                    name
                )));
            }
        };

        if let Some(module) = &config.auth_module {
            pipe.set_authentication_module(module.clone());
        }

        Ok(pipe)
    }

    pub fn create_store<T>(
        store_type: &StoreType,
        id_generator: Arc<dyn IdGenerator>,
    ) -> Result<Box<dyn Store<T>>>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        match store_type {
            StoreType::Memory => Ok(Box::new(MemoryStorage::<T>::new(id_generator))),
            StoreType::Other(name) => Err(PipeError::UnsupportedConfiguration(format!(
                "Store type '{}' is not supported yet",
                name
            ))),
        }
    }
}
