//! Common module - completion callbacks and background dispatch
//!
//! Shared by every asynchronous operation in the crate: pipes report through
//! [`Callback`], authentication modules too, and both submit their work through a
//! [`Dispatcher`].

pub mod callback;
pub mod dispatcher;
pub mod record;

pub use callback::{BoxCallback, Callback, Completion, channel};
pub use dispatcher::{Dispatcher, OperationHandle};
pub use record::record_id;
