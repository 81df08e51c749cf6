use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use tracing::error;

/// A capability invoked when a task body panics.
///
/// Handlers may be called concurrently from any number of panicking tasks, so
/// implementations must be `Send + Sync`. A handler that itself panics is
/// contained by the executor and never propagates further.
pub trait PanicHandler<T>: Send + Sync {
  /// Receives the panic payload and the parameter the task was submitted with.
  fn handle(&self, cause: &(dyn Any + Send), param: &T);
}

impl<T, F> PanicHandler<T> for F
where
  F: Fn(&(dyn Any + Send), &T) + Send + Sync,
{
  fn handle(&self, cause: &(dyn Any + Send), param: &T) {
    self(cause, param)
  }
}

/// The built-in handler: emits the payload, the offending parameter and a
/// backtrace snapshot in one delimited block. Performs no recovery.
#[derive(Debug, Default)]
pub struct LogPanicHandler;

impl<T: fmt::Debug> PanicHandler<T> for LogPanicHandler {
  fn handle(&self, cause: &(dyn Any + Send), param: &T) {
    let backtrace = Backtrace::force_capture().to_string();
    let indented = backtrace.replace('\n', "\n    ");
    error!(
      "========== TASK PANIC CONTAINED ==========\n\
       CAUSE: {}\n\
       PARAM: {:?}\n\
       BACKTRACE:\n    {}\n\
       ==========================================",
      panic_message(cause),
      param,
      indented
    );
  }
}

/// Renders a panic payload as text. Payloads raised through `panic!` carry a
/// `&str` or `String`; anything else (e.g. `panic_any`) is opaque.
pub fn panic_message(cause: &(dyn Any + Send)) -> String {
  if let Some(s) = cause.downcast_ref::<&'static str>() {
    (*s).to_string()
  } else if let Some(s) = cause.downcast_ref::<String>() {
    s.clone()
  } else {
    "<non-string panic payload>".to_string()
  }
}
