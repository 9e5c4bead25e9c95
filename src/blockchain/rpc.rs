// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet capability backed by a JSON-RPC endpoint.
//!
//! Used outside the browser: a node or local signer exposing
//! `eth_requestAccounts`, `eth_sendTransaction` and friends over HTTP
//! (for example a development node with unlocked accounts).

use std::time::Duration;

use alloy::{
    network::Ethereum,
    providers::{Provider, RootProvider},
};
use serde_json::Value;
use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::provider::{ProviderError, ProviderEvent, WalletProvider, EVENT_CHANNEL_CAPACITY};
use super::watcher::EventWatcher;

/// JSON-RPC wallet capability.
#[derive(Clone)]
pub struct RpcWalletProvider {
    client: RootProvider<Ethereum>,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider {
    /// Create a capability for the endpoint at `rpc_url`.
    pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ProviderError::other(format!("Invalid RPC URL: {e}")))?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            client: RootProvider::new_http(url),
            events,
        })
    }

    /// Start polling the endpoint for account and chain changes.
    pub fn spawn_watcher(&self, interval: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let watcher = EventWatcher::new(self.clone(), self.events.clone()).with_interval(interval);
        tokio::spawn(watcher.run(shutdown))
    }
}

impl WalletProvider for RpcWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.client
            .raw_request::<_, Value>(method.to_string().into(), params)
            .await
            .map_err(|e| match e.as_error_resp() {
                Some(payload) => ProviderError::new(payload.code, payload.message.to_string()),
                None => ProviderError::other(format!("RPC error: {e}")),
            })
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
