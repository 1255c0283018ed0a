//! REST implementation of [`Pipe`]
//!
//! | operation | request                                  |
//! |-----------|------------------------------------------|
//! | read      | `GET {url}`                              |
//! | save      | `POST {url}` or `PUT {url}/{id}` if the item carries an id |
//! | remove    | `DELETE {url}/{id}`                      |

use crate::authentication::AuthenticationModule;
use crate::common::{BoxCallback, OperationHandle, record_id};
use crate::error::{PipeError, Result};
use crate::http::{AUTH_TOKEN_HEADER, RequestHeaders};
use crate::pipeline::{Pipe, PipeContext, PipeType};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

pub const DEFAULT_RECORD_ID: &str = "id";

pub struct RestAdapter<T> {
    url: Url,
    record_id: String,
    context: PipeContext,
    auth_module: RwLock<Option<Arc<dyn AuthenticationModule>>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RestAdapter<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(url: Url, context: PipeContext) -> Result<Self> {
        if url.cannot_be_a_base() {
            return Err(PipeError::InvalidConfiguration(format!(
                "'{}' cannot be used as a pipe endpoint",
                url
            )));
        }

        Ok(Self {
            url,
            record_id: DEFAULT_RECORD_ID.to_string(),
            context,
            auth_module: RwLock::new(None),
            _marker: PhantomData,
        })
    }

    /// Name of the field that identifies a record; defaults to `id`
    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = record_id.into();
        self
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    fn item_url(&self, id: &str) -> Result<Url> {
        item_url(&self.url, id)
    }
}

fn item_url(base: &Url, id: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            PipeError::InvalidConfiguration(format!("'{}' cannot be used as a pipe endpoint", base))
        })?
        .pop_if_empty()
        .push(id);
    Ok(url)
}

/// Credential header for the module attached when the call was made, read at
/// request time so a login that finished in between is honoured
fn credential_headers(module: Option<&Arc<dyn AuthenticationModule>>) -> RequestHeaders {
    let mut headers = RequestHeaders::new();
    if let Some(token) = module.and_then(|module| module.credential()) {
        headers.insert(AUTH_TOKEN_HEADER.to_string(), token);
    }
    headers
}

impl<T> Pipe<T> for RestAdapter<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    fn pipe_type(&self) -> PipeType {
        PipeType::Rest
    }

    fn url(&self) -> &Url {
        &self.url
    }

    fn read(&self, callback: BoxCallback<Vec<T>>) -> Result<OperationHandle> {
        let transport = self.context.transport.clone();
        let module = self.authentication_module();
        let url = self.url.clone();

        self.context.dispatcher.dispatch(
            "read",
            async move {
                let headers = credential_headers(module.as_ref());
                let response = transport.get(url.as_str(), &headers).await?;
                if response.is_empty() {
                    return Ok(Vec::new());
                }
                response.json::<Vec<T>>()
            },
            callback,
        )
    }

    fn save(&self, item: T, callback: BoxCallback<T>) -> Result<OperationHandle> {
        let transport = self.context.transport.clone();
        let module = self.authentication_module();
        let base = self.url.clone();
        let id_field = self.record_id.clone();
        let logger = self.context.logger.clone();

        self.context.dispatcher.dispatch(
            "save",
            async move {
                let value = serde_json::to_value(&item)?;
                let body = serde_json::to_vec(&value)?;
                let headers = credential_headers(module.as_ref());

                let response = match record_id(&value, &id_field) {
                    Some(id) => {
                        logger.debug(&format!("Updating record {}", id));
                        let url = item_url(&base, &id)?;
                        transport.put(url.as_str(), body, &headers).await?
                    }
                    None => {
                        logger.debug("Creating record");
                        transport.post(base.as_str(), body, &headers).await?
                    }
                };

                // Servers answering 204 have nothing canonical to send back
                if response.is_empty() {
                    Ok(item)
                } else {
                    response.json::<T>()
                }
            },
            callback,
        )
    }

    fn remove(&self, id: &str, callback: BoxCallback<()>) -> Result<OperationHandle> {
        if id.trim().is_empty() {
            return Err(PipeError::Validation(
                "Record id cannot be empty".to_string(),
            ));
        }

        let transport = self.context.transport.clone();
        let module = self.authentication_module();
        let url = self.item_url(id)?;

        self.context.dispatcher.dispatch(
            "remove",
            async move {
                let headers = credential_headers(module.as_ref());
                transport.delete(url.as_str(), &headers).await?;
                Ok::<_, PipeError>(())
            },
            callback,
        )
    }

    fn set_authentication_module(&self, module: Arc<dyn AuthenticationModule>) {
        self.context.logger.verbose(&format!(
            "Attaching authentication module for {} (authenticated: {})",
            module.base_url(),
            module.is_authenticated()
        ));
        *self
            .auth_module
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(module);
    }

    fn authentication_module(&self) -> Option<Arc<dyn AuthenticationModule>> {
        self.auth_module
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
