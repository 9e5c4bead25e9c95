// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use serde_json::{json, Value};

/// Target network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// Native currency name
    pub currency_name: &'static str,
    /// Native currency symbol
    pub currency_symbol: &'static str,
    /// Native currency decimals
    pub currency_decimals: u8,
}

/// Sepolia test network, the only network records are anchored on.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Sepolia Testnet",
    chain_id: 11_155_111,
    rpc_url: "https://rpc.sepolia.org",
    explorer_url: "https://sepolia.etherscan.io",
    currency_name: "SepoliaETH",
    currency_symbol: "ETH",
    currency_decimals: 18,
};

impl NetworkConfig {
    /// Chain id as the `0x`-prefixed hex quantity wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }

    /// Parameters for `wallet_switchEthereumChain`.
    pub fn switch_chain_params(&self) -> Value {
        json!([{ "chainId": self.chain_id_hex() }])
    }

    /// Parameters for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> Value {
        json!([{
            "chainId": self.chain_id_hex(),
            "chainName": self.name,
            "nativeCurrency": {
                "name": self.currency_name,
                "symbol": self.currency_symbol,
                "decimals": self.currency_decimals,
            },
            "rpcUrls": [self.rpc_url],
            "blockExplorerUrls": [self.explorer_url],
        }])
    }

    /// Explorer link for a transaction.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}
