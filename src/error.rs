use thiserror::Error;

/// Errors surfaced synchronously by [`crate::BoundedExecutor`] submission.
///
/// Task panics are deliberately absent: they never reach the submitter and are
/// only observable through the executor's panic handler.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecutorError {
  /// The dynamic submission path was handed no task body.
  #[error("no task body was provided")]
  InvalidTask,

  /// Closing has begun (or completed); the executor no longer admits tasks.
  #[error("executor is closed, cannot accept new tasks")]
  Closed,
}
