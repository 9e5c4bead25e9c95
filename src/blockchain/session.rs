// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet connection state, kept in step with provider notifications.

use super::gateway::{WalletError, WalletGateway};
use super::provider::{ProviderEvent, WalletProvider};
use crate::models::WalletAddress;

/// What a provider notification did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// The first authorized account is now this one.
    AccountChanged(WalletAddress),
    /// No account is authorized anymore.
    Disconnected,
    /// The active chain changed; state derived from it must be rebuilt.
    ReloadRequired,
    Unchanged,
}

/// The currently connected account, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalletSession {
    account: Option<WalletAddress>,
}

impl WalletSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick up an account the capability already authorized, without prompting.
    pub async fn restore<P: WalletProvider>(gateway: &WalletGateway<P>) -> Self {
        Self {
            account: gateway.connected_account().await,
        }
    }

    /// Prompt for account access (and network) through the gateway.
    pub async fn connect<P: WalletProvider>(
        &mut self,
        gateway: &WalletGateway<P>,
    ) -> Result<WalletAddress, WalletError> {
        let account = gateway.connect().await?;
        self.account = Some(account.clone());
        Ok(account)
    }

    /// Forget the local connection. The capability keeps its authorization.
    pub fn disconnect(&mut self) {
        if let Some(account) = self.account.take() {
            tracing::info!(account = %account, "Wallet disconnected");
        }
    }

    pub fn account(&self) -> Option<&WalletAddress> {
        self.account.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Apply a provider notification.
    pub fn apply(&mut self, event: &ProviderEvent) -> SessionChange {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                None => {
                    self.disconnect();
                    SessionChange::Disconnected
                }
                Some(first) => {
                    let account = WalletAddress::from(first.as_str());
                    if self.account.as_ref().is_some_and(|current| current.matches(&account)) {
                        return SessionChange::Unchanged;
                    }
                    tracing::info!(account = %account, "Active account changed");
                    self.account = Some(account.clone());
                    SessionChange::AccountChanged(account)
                }
            },
            ProviderEvent::ChainChanged(chain_id) => {
                tracing::info!(chain_id = %chain_id, "Active chain changed, reload required");
                SessionChange::ReloadRequired
            }
        }
    }
}

/// `0x1234...5678` form used in user-facing messages.
pub fn short_address(address: &WalletAddress) -> String {
    let raw = address.as_str();
    if raw.len() <= 10 || !raw.is_ascii() {
        return raw.to_string();
    }
    format!("{}...{}", &raw[..6], &raw[raw.len() - 4..])
}
