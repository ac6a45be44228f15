//! Server validity state machine.
//!
//! Address input flows through a [`Debouncer`] into a [`RequestHarness`];
//! completed probes are checked against the expected identity and the
//! [`version_at_least`] gate. The event handlers are synchronous and the
//! `run` loop feeds them one event at a time, so no two handlers interleave.

use crate::core::debounce::Debouncer;
use crate::core::request::{Completion, RequestHarness};
use crate::core::version::version_at_least;
use crate::domain::model::{ServerInfo, ValidityStatus};
use crate::domain::ports::ServerInfoSource;
use crate::utils::error::{Result, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};

pub const VOCASCAN_IDENTIFIER: &str = "vocascan-server";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeState {
    /// No target: nothing entered yet, or the address is empty.
    Idle,
    Probing { generation: u64 },
    Resolved { valid: bool },
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ValiditySettings {
    pub expected_identifier: String,
    pub min_version: String,
    pub debounce: Duration,
    pub loading_hold: Duration,
}

impl Default for ValiditySettings {
    fn default() -> Self {
        Self {
            expected_identifier: VOCASCAN_IDENTIFIER.to_string(),
            min_version: "1.0.0".to_string(),
            debounce: Duration::from_millis(500),
            loading_hold: Duration::from_millis(500),
        }
    }
}

pub struct ServerValidity<S: ServerInfoSource + 'static> {
    source: Arc<S>,
    settings: ValiditySettings,
    harness: RequestHarness<ServerInfo>,
    debouncer: Debouncer<String>,
    address: String,
    probing_address: Option<String>,
    server_info: Option<ServerInfo>,
    state: ProbeState,
    status: ValidityStatus,
    loading_until: Option<Instant>,
}

impl<S: ServerInfoSource + 'static> ServerValidity<S> {
    pub fn new(source: Arc<S>, settings: ValiditySettings) -> Self {
        let debouncer = Debouncer::new(settings.debounce);
        Self {
            source,
            settings,
            harness: RequestHarness::new(),
            debouncer,
            address: String::new(),
            probing_address: None,
            server_info: None,
            state: ProbeState::Idle,
            status: ValidityStatus::default(),
            loading_until: None,
        }
    }

    pub fn status(&self) -> &ValidityStatus {
        &self.status
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn overall_valid(&self) -> bool {
        self.status.overall_valid()
    }

    pub fn is_locked(&self) -> Option<bool> {
        self.status.is_locked
    }

    /// Empty address means "no target", which is not the same as invalid.
    pub fn is_applicable(&self) -> bool {
        !self.address.is_empty()
    }

    /// Raw, not yet debounced, address edit.
    ///
    /// Resets every flag and supersedes the in-flight probe: its answer
    /// belongs to an address that is no longer shown.
    pub fn address_changed(&mut self, address: &str) {
        self.address = address.to_string();
        let was_probing = matches!(self.state, ProbeState::Probing { .. });
        self.harness.cancel_live();
        self.probing_address = None;
        self.server_info = None;
        self.loading_until = None;

        self.state = if was_probing {
            ProbeState::Cancelled
        } else {
            ProbeState::Idle
        };
        self.status = if address.is_empty() {
            ValidityStatus::default()
        } else {
            ValidityStatus::probing()
        };
    }

    /// The debounced address settled; issues exactly one probe for it.
    pub fn address_settled(&mut self, address: &str) -> Option<u64> {
        if address != self.address {
            // a newer edit already superseded this value
            return None;
        }
        if address.is_empty() {
            self.harness.cancel_live();
            self.state = ProbeState::Idle;
            self.status = ValidityStatus::default();
            return None;
        }

        self.status = ValidityStatus::probing();
        self.loading_until = None;

        let source = Arc::clone(&self.source);
        let target = address.to_string();
        let generation = self
            .harness
            .start(async move { source.fetch_server_info(&target).await });

        tracing::debug!("Probing {} (generation {})", address, generation);
        self.probing_address = Some(address.to_string());
        self.state = ProbeState::Probing { generation };
        Some(generation)
    }

    /// Applies a probe completion. Returns `false` when it was stale or
    /// cancelled, i.e. when no result was recorded.
    pub fn handle_completion(&mut self, completion: Completion<ServerInfo>) -> bool {
        let outcome = match self.harness.accept(completion) {
            Ok(outcome) => outcome,
            Err(_) => return false,
        };
        let address = self.probing_address.take().unwrap_or_default();

        match outcome {
            Ok(info) => self.apply_info(&address, info),
            Err(err) if err.is_cancellation() => {
                // the source gave up on its own; nothing is left to resolve
                tracing::debug!("Probe of {} was cancelled by the source", address);
                self.state = ProbeState::Cancelled;
                self.status.loading = false;
                return false;
            }
            Err(err) => {
                tracing::warn!("Server {} not reachable: {}", address, err);
                self.status.is_reachable = Some(false);
                self.status.checked_at = Some(chrono::Utc::now());
                self.state = ProbeState::Resolved { valid: false };
            }
        }

        self.loading_until = Some(Instant::now() + self.settings.loading_hold);
        true
    }

    fn apply_info(&mut self, address: &str, info: ServerInfo) {
        let is_valid_server =
            info.identifier.as_deref() == Some(self.settings.expected_identifier.as_str());
        let is_valid_version =
            version_at_least(info.version.as_deref(), &self.settings.min_version);
        tracing::info!(
            "Probe of {} resolved: identity ok={}, version ok={}, locked={}",
            address,
            is_valid_server,
            is_valid_version,
            info.locked
        );

        self.status.is_valid_server = Some(is_valid_server);
        self.status.is_valid_version = Some(is_valid_version);
        self.status.is_locked = Some(info.locked);
        self.status.is_reachable = Some(true);
        self.status.version = info.version.clone();
        self.status.checked_at = Some(chrono::Utc::now());
        self.server_info = Some(info);

        self.state = ProbeState::Resolved {
            valid: self.status.overall_valid(),
        };
    }

    /// Ends the cosmetic loading phase. Flags are unaffected.
    pub fn finish_loading(&mut self) {
        self.loading_until = None;
        if !matches!(self.state, ProbeState::Probing { .. }) {
            self.status.loading = false;
        }
    }

    /// Releases every timer and the live probe; no write happens afterwards.
    pub fn teardown(&mut self) {
        self.harness.cancel_live();
        self.debouncer.cancel();
        self.loading_until = None;
        self.probing_address = None;
        self.status.loading = false;
        if matches!(self.state, ProbeState::Probing { .. }) {
            self.state = ProbeState::Cancelled;
        }
    }

    /// Last snapshot accepted for the current address.
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// The error describing the current resolution, if any.
    pub fn failure(&self) -> Option<SyncError> {
        if self.status.is_reachable == Some(false) {
            return Some(SyncError::Unreachable {
                address: self.address.clone(),
                message: "no response".to_string(),
            });
        }
        if self.status.is_valid_server == Some(false) {
            return Some(SyncError::WrongIdentity {
                identifier: self
                    .server_info
                    .as_ref()
                    .and_then(|info| info.identifier.clone())
                    .unwrap_or_default(),
            });
        }
        if self.status.is_valid_version == Some(false) {
            return Some(SyncError::VersionTooOld {
                reported: self.status.version.clone().unwrap_or_default(),
                minimum: self.settings.min_version.clone(),
            });
        }
        None
    }

    /// Validates one address without debouncing and waits for the result.
    pub async fn probe_once(&mut self, address: &str) -> Result<ValidityStatus> {
        self.address_changed(address);
        if self.address_settled(address).is_none() {
            return Ok(self.status.clone());
        }
        while self.harness.is_in_flight() {
            let completion = self.harness.next_completion().await;
            if self.handle_completion(completion) {
                self.finish_loading();
                break;
            }
        }
        Ok(self.status.clone())
    }

    /// Whether an edit is still waiting for its debounce or its probe.
    pub fn has_pending_work(&self) -> bool {
        self.debouncer.is_pending() || self.harness.is_in_flight()
    }

    /// Event loop: raw addresses in, status snapshots out.
    ///
    /// Returns once `addresses` is closed, after tearing everything down.
    /// Work still pending at that point is cancelled, as when the address
    /// field goes away.
    pub async fn run(
        self,
        addresses: mpsc::Receiver<String>,
        updates: watch::Sender<ValidityStatus>,
    ) {
        self.drive(addresses, updates, false).await;
    }

    /// Like [`run`](Self::run), but a closed input lets the last address
    /// finish its debounce and probe before tearing down. Used for piped
    /// input, where the end of the stream is not the end of interest.
    pub async fn run_to_end(
        self,
        addresses: mpsc::Receiver<String>,
        updates: watch::Sender<ValidityStatus>,
    ) {
        self.drive(addresses, updates, true).await;
    }

    async fn drive(
        mut self,
        mut addresses: mpsc::Receiver<String>,
        updates: watch::Sender<ValidityStatus>,
        finish_pending: bool,
    ) {
        let mut input_open = true;
        loop {
            if !input_open && !self.has_pending_work() {
                break;
            }
            let loading_deadline = self.loading_until.unwrap_or_else(Instant::now);
            tokio::select! {
                input = addresses.recv(), if input_open => match input {
                    Some(address) => {
                        self.address_changed(&address);
                        self.debouncer.push(address);
                    }
                    None if finish_pending => {
                        tracing::debug!("Address input closed, finishing pending probe");
                        input_open = false;
                        continue;
                    }
                    None => break,
                },
                settled = self.debouncer.settled() => {
                    self.address_settled(&settled);
                }
                completion = self.harness.next_completion() => {
                    // stale completions leave the status untouched
                    self.handle_completion(completion);
                }
                _ = sleep_until(loading_deadline), if self.loading_until.is_some() => {
                    self.finish_loading();
                }
            }
            updates.send_replace(self.status.clone());
        }

        self.teardown();
        updates.send_replace(self.status.clone());
        tracing::debug!("Server validity loop stopped");
    }
}
