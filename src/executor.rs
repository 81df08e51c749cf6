use crate::error::ExecutorError;
use crate::handler::{panic_message, LogPanicHandler, PanicHandler};
use crate::ledger::InFlightLedger;
use crate::task::{TaskBody, TaskFuture};

use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Once;
use tokio::runtime::Handle as TokioHandle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, trace, warn, Instrument};

lazy_static::lazy_static! {
  static ref NEXT_TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);
}

/// A bounded executor: admits submitted tasks through a fixed number of
/// permits, runs each admitted body as an independent task on its runtime
/// handle, contains panics, and tracks drain of everything in flight.
///
/// `T` is the task parameter type. It must be `Clone` because the executor
/// retains a copy of the parameter for panic reporting; the body receives the
/// original by value. Share the executor across submitters with an `Arc`.
pub struct BoundedExecutor<T: Clone + Send + 'static> {
  name: Arc<String>,
  capacity: usize,
  permits: Arc<Semaphore>,
  ledger: Arc<InFlightLedger>,
  panic_handler: Arc<dyn PanicHandler<T>>,
  close_token: CancellationToken,
  teardown_once: Once,
  runtime: TokioHandle,
}

impl<T: Clone + Send + fmt::Debug + 'static> BoundedExecutor<T> {
  /// Creates an executor with the built-in [`LogPanicHandler`].
  ///
  /// A `capacity` of zero is clamped to one; it is never an error.
  pub fn new(capacity: usize, runtime: TokioHandle, name: &str) -> Self {
    Self::with_panic_handler(capacity, Arc::new(LogPanicHandler), runtime, name)
  }
}

impl<T: Clone + Send + 'static> BoundedExecutor<T> {
  /// Creates an executor that routes task panics to `handler`.
  ///
  /// A `capacity` of zero is clamped to one; it is never an error.
  pub fn with_panic_handler(
    capacity: usize,
    handler: Arc<dyn PanicHandler<T>>,
    runtime: TokioHandle,
    name: &str,
  ) -> Self {
    let capacity = capacity.max(1);
    Self {
      name: Arc::new(name.to_string()),
      capacity,
      permits: Arc::new(Semaphore::new(capacity)),
      ledger: Arc::new(InFlightLedger::new()),
      panic_handler: handler,
      close_token: CancellationToken::new(),
      teardown_once: Once::new(),
      runtime,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Number of tasks submitted but not yet finished (success or panic).
  pub fn in_flight_count(&self) -> usize {
    self.ledger.in_flight()
  }

  pub fn available_permits(&self) -> usize {
    self.permits.available_permits()
  }

  /// Whether closing has begun (or completed).
  pub fn is_closed(&self) -> bool {
    self.close_token.is_cancelled()
  }

  /// Submits one task: `body` applied to `param`, driven as an independent
  /// task on the executor's runtime, with at most `capacity` bodies running
  /// at any instant.
  ///
  /// Suspends the caller while all permits are held — saturation applies
  /// backpressure to the submitter rather than rejecting the task. A panic
  /// inside the body is routed to the construction-time panic handler and
  /// never surfaces here.
  ///
  /// # Errors
  /// Returns [`ExecutorError::Closed`] if closing has begun, including when
  /// close begins while this caller is suspended awaiting admission.
  pub async fn submit<F, Fut>(&self, body: F, param: T) -> Result<(), ExecutorError>
  where
    F: FnOnce(T) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
  {
    let boxed: TaskBody<T> = Box::new(move |p| Box::pin(body(p)) as TaskFuture);
    self
      .submit_with_handler(Some(boxed), param, Some(self.panic_handler.clone()))
      .await
  }

  /// The dynamic submission path, for callers that assemble work at runtime.
  ///
  /// `body: None` fails with [`ExecutorError::InvalidTask`] before any state
  /// changes. `handler: None` still contains a panic in the body but reports
  /// it nowhere beyond a trace line; `Some` routes it to that handler for
  /// this submission only.
  pub async fn submit_with_handler(
    &self,
    body: Option<TaskBody<T>>,
    param: T,
    handler: Option<Arc<dyn PanicHandler<T>>>,
  ) -> Result<(), ExecutorError> {
    let body = match body {
      Some(body) => body,
      None => {
        warn!(executor = %self.name, "submit: no task body provided");
        return Err(ExecutorError::InvalidTask);
      }
    };
    if self.close_token.is_cancelled() {
      warn!(executor = %self.name, "submit: executor is closed");
      return Err(ExecutorError::Closed);
    }

    // Counted before admission blocking so a racing close sees this
    // submission and waits for it to either finish or bail out below.
    self.ledger.begin();

    let permit = tokio::select! {
      biased;

      _ = self.close_token.cancelled() => {
        self.ledger.finish();
        debug!(executor = %self.name, "submit: close began while awaiting admission");
        return Err(ExecutorError::Closed);
      }

      acquired = self.permits.clone().acquire_owned() => {
        match acquired {
          Ok(permit) => permit,
          Err(_) => {
            // The semaphore only closes during teardown.
            self.ledger.finish();
            return Err(ExecutorError::Closed);
          }
        }
      }
    };

    let task_id = NEXT_TASK_ID_COUNTER.fetch_add(1, AtomicOrdering::Relaxed);
    trace!(
      executor = %self.name,
      %task_id,
      available = self.permits.available_permits(),
      "task admitted"
    );

    let param_for_handler = param.clone();
    let ledger = self.ledger.clone();
    let executor_name = self.name.clone();
    let span = info_span!("turnstile_task", executor = %*self.name, %task_id);

    self.runtime.spawn(
      async move {
        // Both the closure call that builds the future and the future itself
        // can panic; either way the payload ends up in `outcome`.
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| body(param))) {
          Ok(future) => AssertUnwindSafe(future).catch_unwind().await,
          Err(cause) => Err(cause),
        };

        if let Err(cause) = outcome {
          match handler {
            Some(handler) => {
              let handler_run = panic::catch_unwind(AssertUnwindSafe(|| {
                handler.handle(cause.as_ref(), &param_for_handler)
              }));
              if handler_run.is_err() {
                error!(
                  executor = %*executor_name,
                  %task_id,
                  "panic handler itself panicked; swallowing"
                );
              }
            }
            None => {
              trace!(
                executor = %*executor_name,
                %task_id,
                cause = %panic_message(cause.as_ref()),
                "task panicked with no handler configured"
              );
            }
          }
        }

        // Permit release must precede the ledger decrement: a drain waiter
        // that wakes on zero must find every permit returned.
        drop(permit);
        ledger.finish();
      }
      .instrument(span),
    );

    Ok(())
  }

  /// Suspends until every submitted task has finished, success or panic.
  ///
  /// Re-entrant: any number of callers may wait concurrently and all unblock
  /// once the count reaches zero. Does not itself prevent further
  /// submissions, so the count may rise again afterwards.
  pub async fn wait_all(&self) {
    self.ledger.drained().await;
  }

  /// Closes the executor: rejects all further submissions (submitters
  /// currently suspended in admission fail with [`ExecutorError::Closed`]
  /// rather than deadlocking), waits for everything in flight to finish,
  /// then tears down the permit resource.
  ///
  /// Idempotent and callable concurrently: exactly one caller performs the
  /// teardown, and every caller returns only after it has completed.
  pub async fn close(&self) {
    if !self.close_token.is_cancelled() {
      info!(
        executor = %self.name,
        in_flight = self.ledger.in_flight(),
        "close requested; draining"
      );
    }
    self.close_token.cancel();
    self.ledger.drained().await;
    self.teardown_once.call_once(|| {
      self.permits.close();
      debug!(executor = %self.name, "admission permits torn down");
    });
  }
}

impl<T: Clone + Send + 'static> fmt::Debug for BoundedExecutor<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BoundedExecutor")
      .field("name", &self.name)
      .field("capacity", &self.capacity)
      .field("in_flight", &self.ledger.in_flight())
      .field("closed", &self.close_token.is_cancelled())
      .finish_non_exhaustive()
  }
}

impl<T: Clone + Send + 'static> Drop for BoundedExecutor<T> {
  fn drop(&mut self) {
    // Never blocks: in-flight tasks own their permits and ledger slots and
    // finish on the runtime regardless of this instance going away.
    if !self.close_token.is_cancelled() {
      debug!(
        executor = %self.name,
        in_flight = self.ledger.in_flight(),
        "executor dropped without close; rejecting further submissions"
      );
      self.close_token.cancel();
    }
  }
}
