use futures_turnstile::BoundedExecutor;

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::INFO)
    .with_target(false)
    .init();
  info!("--- Saturation / Backpressure Example ---");

  let executor = BoundedExecutor::<usize>::new(
    3, // Concurrency limit
    Handle::current(),
    "saturation_pool",
  );

  let start = Instant::now();
  for i in 0..9 {
    // Once three tasks hold permits, each further submit suspends here until
    // a running task finishes: saturation pushes back on the submitter
    // instead of rejecting work.
    executor
      .submit(
        |n: usize| async move {
          info!("task {} holds a permit", n);
          tokio::time::sleep(Duration::from_millis(200)).await;
          info!("task {} releases its permit", n);
        },
        i,
      )
      .await
      .expect("Failed to submit task");
    info!(
      "submitted task {} after {:?} ({} permits free)",
      i,
      start.elapsed(),
      executor.available_permits()
    );
  }

  executor.wait_all().await;
  info!("9 x 200ms tasks at capacity 3 drained in {:?} (three waves).", start.elapsed());

  executor.close().await;
  info!("--- Saturation Example End ---");
}
