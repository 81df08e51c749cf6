use tokio::sync::watch;

/// Counts tasks that have been submitted but not yet finished, and lets any
/// number of waiters suspend until that count drains to zero.
///
/// `begin` runs in the submitter before admission blocking starts; `finish`
/// runs exactly once per task, after its permit has been released.
#[derive(Debug)]
pub(crate) struct InFlightLedger {
  count_tx: watch::Sender<usize>,
  count_rx: watch::Receiver<usize>,
}

impl InFlightLedger {
  pub(crate) fn new() -> Self {
    let (count_tx, count_rx) = watch::channel(0);
    Self { count_tx, count_rx }
  }

  pub(crate) fn begin(&self) {
    self.count_tx.send_modify(|n| *n += 1);
  }

  pub(crate) fn finish(&self) {
    self.count_tx.send_modify(|n| *n -= 1);
  }

  pub(crate) fn in_flight(&self) -> usize {
    *self.count_rx.borrow()
  }

  /// Suspends until the count reaches zero; returns immediately when nothing
  /// is in flight. Safe to call from any number of tasks concurrently.
  pub(crate) async fn drained(&self) {
    let mut rx = self.count_rx.clone();
    // The sender lives in `self`, so the channel cannot close while a
    // borrow of the ledger is held.
    let _ = rx.wait_for(|n| *n == 0).await;
  }
}
