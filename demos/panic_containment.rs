use futures_turnstile::{panic_message, BoundedExecutor, PanicHandler};

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();
  info!("--- Panic Containment Example ---");

  let handler: Arc<dyn PanicHandler<String>> =
    Arc::new(|cause: &(dyn Any + Send), param: &String| {
      warn!("custom handler: '{}' failed with '{}'", param, panic_message(cause));
    });
  let executor = BoundedExecutor::with_panic_handler(
    1, // Concurrency limit
    handler,
    Handle::current(),
    "containment_pool",
  );

  executor
    .submit(
      |job: String| async move {
        info!("{}: starting, about to panic", job);
        tokio::time::sleep(Duration::from_millis(100)).await;
        panic!("{} blew up on purpose", job);
      },
      "doomed-job".to_string(),
    )
    .await
    .expect("Failed to submit panicking task");

  // The panic is contained: the permit comes back and this task runs.
  executor
    .submit(
      |job: String| async move {
        info!("{}: the executor is still healthy", job);
      },
      "survivor-job".to_string(),
    )
    .await
    .expect("Failed to submit follow-up task");

  executor.wait_all().await;
  info!("Drained after the panic; {} tasks in flight.", executor.in_flight_count());

  executor.close().await;
  info!("--- Panic Containment Example End ---");
}
