// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Account/Chain Watcher
//!
//! A JSON-RPC endpoint cannot push `accountsChanged` or `chainChanged`. The
//! watcher polls `eth_accounts` and `eth_chainId` and broadcasts the
//! corresponding [`ProviderEvent`] whenever either value differs from the
//! previous poll. The first poll only records the baseline.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::provider::{ProviderError, ProviderEvent, WalletProvider};

/// Default interval between polls.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(4);

/// Background task emitting account and chain change events.
pub struct EventWatcher<P> {
    provider: P,
    events: broadcast::Sender<ProviderEvent>,
    poll_interval: Duration,
    accounts: Option<Vec<String>>,
    chain_id: Option<String>,
}

impl<P: WalletProvider> EventWatcher<P> {
    pub fn new(provider: P, events: broadcast::Sender<ProviderEvent>) -> Self {
        Self {
            provider,
            events,
            poll_interval: DEFAULT_WATCH_INTERVAL,
            accounts: None,
            chain_id: None,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the watcher loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(watcher.run(shutdown.clone()));
    /// ```
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Wallet event watcher starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Wallet event watcher shutting down");
                return;
            }

            if let Err(e) = self.poll_step().await {
                warn!(error = %e, "Wallet event poll failed, will retry");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Wallet event watcher shutting down");
                    return;
                }
            }
        }
    }

    /// Poll both values once and emit events for whatever changed.
    pub async fn poll_step(&mut self) -> Result<(), ProviderError> {
        let accounts = self.provider.request("eth_accounts", json!([])).await?;
        let accounts: Vec<String> = serde_json::from_value(accounts)
            .map_err(|e| ProviderError::other(format!("malformed eth_accounts response: {e}")))?;

        let chain_id = match self.provider.request("eth_chainId", json!([])).await? {
            Value::String(chain_id) => chain_id.to_ascii_lowercase(),
            other => {
                return Err(ProviderError::other(format!(
                    "malformed eth_chainId response: {other}"
                )))
            }
        };

        if let Some(previous) = self.accounts.replace(accounts.clone()) {
            if previous != accounts {
                debug!(count = accounts.len(), "Authorized accounts changed");
                self.emit(ProviderEvent::AccountsChanged(accounts));
            }
        }

        if let Some(previous) = self.chain_id.replace(chain_id.clone()) {
            if previous != chain_id {
                debug!(chain_id = %chain_id, "Active chain changed");
                self.emit(ProviderEvent::ChainChanged(chain_id));
            }
        }

        Ok(())
    }

    fn emit(&self, event: ProviderEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
