use futures_turnstile::BoundedExecutor;

use std::time::Duration;

use tokio::runtime::Handle;
use tracing::info;

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .with_target(false)
    .init();
  info!("--- Basic Usage Example ---");

  let executor = BoundedExecutor::<String>::new(
    2, // Concurrency limit
    Handle::current(),
    "basic_pool",
  );

  for i in 0..4 {
    executor
      .submit(
        |job: String| async move {
          info!("{}: starting", job);
          tokio::time::sleep(Duration::from_millis(150)).await;
          info!("{}: finished", job);
        },
        format!("job-{}", i),
      )
      .await
      .expect("Failed to submit task");
  }

  info!(
    "All four jobs submitted; {} currently in flight.",
    executor.in_flight_count()
  );

  executor.wait_all().await;
  info!("Everything drained. Closing executor.");

  executor.close().await;
  info!("--- Basic Usage Example End ---");
}
