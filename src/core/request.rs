//! Cancellable request harness.
//!
//! Owns at most one live request per input generation. Starting a new
//! request cancels the previous one first. Cancellation is cooperative: the
//! spawned task stops waiting on the network and reports nothing, and any
//! completion that still arrives for an old generation is discarded by
//! [`RequestHarness::accept`].

use crate::utils::error::{Result, SyncError};
use std::future::Future;
use tokio::sync::{mpsc, watch};

/// Cancellation token for one request. Dropping it cancels the request.
#[derive(Debug)]
pub struct RequestHandle {
    generation: u64,
    cancel_tx: watch::Sender<bool>,
}

impl RequestHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

impl Drop for RequestHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug)]
pub struct Completion<T> {
    pub(crate) generation: u64,
    pub(crate) outcome: Result<T>,
}

impl<T> Completion<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct RequestHarness<T> {
    next_generation: u64,
    live: Option<RequestHandle>,
    completions_tx: mpsc::UnboundedSender<Completion<T>>,
    completions_rx: mpsc::UnboundedReceiver<Completion<T>>,
}

impl<T: Send + 'static> RequestHarness<T> {
    pub fn new() -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            next_generation: 1,
            live: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Starts a new request after cancelling the previous one.
    pub fn start<F>(&mut self, request: F) -> u64
    where
        F: Future<Output = Result<T>> + Send + 'static,
    {
        self.cancel_live();

        let generation = self.next_generation;
        self.next_generation += 1;

        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let flag = cancel_rx.clone();
        let completions_tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let cancelled = async move {
                let _ = cancel_rx.wait_for(|cancelled| *cancelled).await;
            };
            tokio::select! {
                outcome = request => {
                    if *flag.borrow() {
                        return;
                    }
                    let _ = completions_tx.send(Completion { generation, outcome });
                }
                _ = cancelled => {
                    tracing::debug!("Request generation {} cancelled in flight", generation);
                }
            }
        });

        tracing::debug!("Started request generation {}", generation);
        self.live = Some(RequestHandle {
            generation,
            cancel_tx,
        });
        generation
    }

    /// Cancels the request of `generation` if it is still the live one.
    pub fn cancel(&mut self, generation: u64) -> bool {
        if self.live_generation() == Some(generation) {
            self.cancel_live();
            true
        } else {
            false
        }
    }

    pub fn cancel_live(&mut self) {
        if let Some(handle) = self.live.take() {
            tracing::debug!("Superseding request generation {}", handle.generation);
            handle.cancel();
        }
    }

    pub fn live_generation(&self) -> Option<u64> {
        self.live.as_ref().map(RequestHandle::generation)
    }

    pub fn is_in_flight(&self) -> bool {
        self.live.is_some()
    }

    /// Waits for the next completion of any generation, stale ones included.
    pub async fn next_completion(&mut self) -> Completion<T> {
        match self.completions_rx.recv().await {
            Some(completion) => completion,
            // the harness itself holds a sender, so the channel never closes
            None => std::future::pending().await,
        }
    }

    /// Lets a completion through only if it belongs to the live request.
    ///
    /// A stale or cancelled completion yields `Err(SyncError::Cancelled)` and
    /// must not touch shared state.
    pub fn accept(&mut self, completion: Completion<T>) -> Result<Result<T>> {
        match &self.live {
            Some(handle) if handle.generation == completion.generation && !handle.is_cancelled() => {
                self.live = None;
                Ok(completion.outcome)
            }
            _ => {
                tracing::debug!(
                    "Discarding stale completion of generation {}",
                    completion.generation
                );
                Err(SyncError::Cancelled)
            }
        }
    }
}

impl<T: Send + 'static> Default for RequestHarness<T> {
    fn default() -> Self {
        Self::new()
    }
}
