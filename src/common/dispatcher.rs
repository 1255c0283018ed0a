//! Background execution of asynchronous operations
//!
//! Every pipe and authentication operation is submitted to a tokio runtime as its
//! own task. The calling thread never blocks; the task reports exactly one outcome
//! to the callback it was given.

use crate::common::callback::BoxCallback;
use crate::error::{PipeError, Result};
use crate::logging::Logger;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Submits operations to a runtime and wires their outcome to a callback
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    handle: Option<Handle>,
    logger: Logger,
}

impl Dispatcher {
    /// Dispatcher bound to a specific runtime
    pub fn new(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            logger: Logger::default(),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    fn runtime(&self) -> Result<Handle> {
        match &self.handle {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|e| {
                PipeError::InvalidConfiguration(format!(
                    "No tokio runtime available to run the operation: {}",
                    e
                ))
            }),
        }
    }

    /// Spawn `operation` and deliver its outcome to `callback`.
    ///
    /// Returns an error only when nothing was spawned, in which case the callback
    /// is dropped without being invoked.
    pub fn dispatch<T, F>(
        &self,
        name: &str,
        operation: F,
        callback: BoxCallback<T>,
    ) -> Result<OperationHandle>
    where
        T: Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        let runtime = self.runtime()?;
        let logger = self.logger.clone();
        let name = name.to_string();

        logger.trace(&format!("Dispatching {}", name));

        // Owned by the task so that dropping it unrun still reports a failure
        let pending = Pending::new(callback);

        let join = runtime.spawn(async move {
            let started = Instant::now();
            let outcome = match AssertUnwindSafe(operation).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(PipeError::Internal(format!("{} panicked", name))),
            };

            logger.notify_completion(&name, started.elapsed(), outcome.is_ok());
            pending.complete(outcome);
        });

        Ok(OperationHandle { join })
    }
}

/// Callback that fires at most once, and with a failure if dropped unfired
///
/// The runtime drops a task's future without polling it to completion when it
/// shuts down, or when the task was spawned onto a runtime that is already gone.
struct Pending<T: Send + 'static> {
    callback: Option<BoxCallback<T>>,
}

impl<T: Send + 'static> Pending<T> {
    fn new(callback: BoxCallback<T>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    fn complete(mut self, outcome: Result<T>) {
        if let Some(callback) = self.callback.take() {
            match outcome {
                Ok(data) => callback.on_success(data),
                Err(error) => callback.on_failure(error),
            }
        }
    }
}

impl<T: Send + 'static> Drop for Pending<T> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            callback.on_failure(PipeError::Internal(
                "operation was cancelled before completing".to_string(),
            ));
        }
    }
}

/// Handle on a dispatched operation
///
/// Dropping it does not cancel the operation; the callback still fires.
#[derive(Debug)]
pub struct OperationHandle {
    join: JoinHandle<()>,
}

impl OperationHandle {
    /// Wait until the callback has returned
    pub async fn join(self) -> Result<()> {
        self.join
            .await
            .map_err(|e| PipeError::Internal(format!("Callback did not complete: {}", e)))
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
