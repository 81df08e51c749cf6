use std::future::Future;
use std::pin::Pin;

/// The future a task body yields once handed its parameter. The executor
/// drives it to completion on its runtime handle.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A boxed unit of work: applied to its parameter, produces the future to run.
///
/// The generic [`crate::BoundedExecutor::submit`] boxes closures into this
/// shape; it only appears directly on the dynamic submission path, where an
/// absent body is representable.
pub type TaskBody<T> = Box<dyn FnOnce(T) -> TaskFuture + Send + 'static>;
