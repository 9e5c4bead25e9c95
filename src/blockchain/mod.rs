// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet gateway for the Sepolia test network.
//!
//! This module provides functionality for:
//! - Connecting a wallet account and enforcing the target network
//! - Sending the transaction that anchors a health record
//! - Polling for the transaction receipt
//! - Following account and chain change notifications

pub mod gateway;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod types;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::{PollSettings, SubmittedTransaction, WalletError, WalletGateway};
pub use provider::{ProviderError, ProviderEvent, WalletProvider};
pub use rpc::RpcWalletProvider;
pub use session::{SessionChange, WalletSession};
pub use types::*;
