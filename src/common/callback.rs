//! Completion callbacks for asynchronous operations
//!
//! A [`Callback`] is consumed by its terminal call, so an implementation can be
//! invoked at most once by construction. The [`Dispatcher`](super::Dispatcher)
//! guarantees it is invoked at least once.

use crate::error::{PipeError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Receiver of the terminal outcome of one asynchronous operation
pub trait Callback<T>: Send + 'static {
    fn on_success(self: Box<Self>, data: T);

    fn on_failure(self: Box<Self>, error: PipeError);
}

pub type BoxCallback<T> = Box<dyn Callback<T>>;

impl<T, F> Callback<T> for F
where
    F: FnOnce(Result<T>) + Send + 'static,
{
    fn on_success(self: Box<Self>, data: T) {
        (*self)(Ok(data))
    }

    fn on_failure(self: Box<Self>, error: PipeError) {
        (*self)(Err(error))
    }
}

/// Callback half of [`channel`]
pub struct ChannelCallback<T> {
    sender: oneshot::Sender<Result<T>>,
}

impl<T: Send + 'static> Callback<T> for ChannelCallback<T> {
    fn on_success(self: Box<Self>, data: T) {
        // The receiver may have been dropped by a caller that lost interest
        let _ = self.sender.send(Ok(data));
    }

    fn on_failure(self: Box<Self>, error: PipeError) {
        let _ = self.sender.send(Err(error));
    }
}

/// Future half of [`channel`], resolving to the operation's outcome
pub struct Completion<T> {
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T> Completion<T> {
    /// Block the current thread until the outcome arrives.
    ///
    /// Must not be called from within an asynchronous execution context.
    pub fn wait_blocking(self) -> Result<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(dropped_error()))
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(dropped_error())))
    }
}

fn dropped_error() -> PipeError {
    PipeError::Internal("operation was dropped before completing".to_string())
}

/// Create a callback whose outcome is delivered to an awaitable [`Completion`]
///
/// This lets the caller pick the context in which the result is consumed instead
/// of running its logic on the worker that finished the request.
pub fn channel<T: Send + 'static>() -> (BoxCallback<T>, Completion<T>) {
    let (sender, receiver) = oneshot::channel();
    (
        Box::new(ChannelCallback { sender }),
        Completion { receiver },
    )
}
