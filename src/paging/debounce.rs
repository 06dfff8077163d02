use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

/// Trailing debounce onto an action channel.
///
/// Every `trigger` re-arms the timer; only the last action of a burst is
/// delivered, once `delay` has passed without another trigger. Whoever
/// handles the delivered action re-checks its own guards at that point.
pub struct Debouncer<A> {
    delay: Duration,
    tx: mpsc::UnboundedSender<A>,
    pending: Option<CancellationToken>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<A>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    pub fn trigger(&mut self, action: A) {
        self.cancel();

        let token = CancellationToken::new();
        self.pending = Some(token.clone());
        let tx = self.tx.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    tx.send(action).ok();
                }
            }
        });
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl<A> Drop for Debouncer<A> {
    fn drop(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}
