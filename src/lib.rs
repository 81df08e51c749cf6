//! A Tokio-based bounded executor that caps how many submitted tasks run in
//! parallel, tracks drain of everything in flight, and contains task panics.

mod error;
mod executor;
mod handler;
mod ledger;
mod task;

pub use error::ExecutorError;
pub use executor::BoundedExecutor;
pub use handler::{panic_message, LogPanicHandler, PanicHandler};
pub use task::{TaskBody, TaskFuture};
