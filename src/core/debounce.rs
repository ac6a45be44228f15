use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Holds back a rapidly changing value until it has been stable for `delay`.
///
/// Only the latest pushed value is kept; earlier ones are dropped, never
/// queued. Every push restarts the timer.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T) {
        self.pending = Some((value, Instant::now() + self.delay));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the value not yet emitted, e.g. when the consumer goes away.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// Resolves with the pending value once its deadline passes.
    ///
    /// Never resolves while nothing is pending. Cancel-safe: dropping the
    /// future keeps the pending value, so it can sit in a `select!` loop.
    pub async fn settled(&mut self) -> T {
        loop {
            let deadline = match &self.pending {
                Some((_, deadline)) => *deadline,
                None => std::future::pending::<Instant>().await,
            };
            sleep_until(deadline).await;
            if let Some((value, deadline)) = self.pending.take() {
                if deadline <= Instant::now() {
                    return value;
                }
                self.pending = Some((value, deadline));
            }
        }
    }
}
