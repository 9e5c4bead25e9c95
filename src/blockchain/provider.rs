// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The wallet capability consumed by the gateway.
//!
//! A capability answers EIP-1193 style JSON-RPC requests and pushes
//! `accountsChanged` / `chainChanged` notifications.

use std::{future::Future, sync::Arc};

use serde_json::Value;
use tokio::sync::broadcast;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Buffer size of provider event channels.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Error returned by a wallet capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ProviderError {
    /// JSON-RPC / EIP-1193 error code, when the capability supplied one.
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Error without a code (transport failures, malformed responses).
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_REQUEST)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code == Some(UNRECOGNIZED_CHAIN)
    }
}

/// Notification pushed by a wallet capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The set of authorized accounts changed (empty = none authorized).
    AccountsChanged(Vec<String>),
    /// The active chain changed; carries the new hex chain id.
    ChainChanged(String),
}

/// An externally supplied wallet capability.
pub trait WalletProvider: Send + Sync {
    /// Issue a JSON-RPC request (`params` is the positional parameter array).
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send;

    /// Subscribe to account and chain notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

impl<P: WalletProvider> WalletProvider for Arc<P> {
    fn request(
        &self,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ProviderError>> + Send {
        P::request(self, method, params)
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        P::subscribe(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_wallet_error_codes() {
        let rejected = ProviderError::new(USER_REJECTED_REQUEST, "User rejected the request.");
        assert!(rejected.is_user_rejection());
        assert!(!rejected.is_unrecognized_chain());

        let unknown_chain = ProviderError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID");
        assert!(unknown_chain.is_unrecognized_chain());
        assert!(!unknown_chain.is_user_rejection());

        assert!(!ProviderError::other("transport closed").is_user_rejection());
    }
}
