// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet gateway: the only component that talks to the wallet capability.
//!
//! The gateway connects accounts, keeps the capability on the target network,
//! sends the zero-value self-transaction that anchors a health record and
//! polls for its receipt.
//!
//! ## Absent capability
//!
//! A gateway built with [`WalletGateway::absent`] has no capability. Every
//! operation then fails with [`WalletError::NoProvider`], except
//! [`WalletGateway::connected_account`] which reports no account.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use super::provider::{ProviderEvent, WalletProvider};
use super::types::{NetworkConfig, SEPOLIA};
use crate::models::{HealthPayload, TxStatus, WalletAddress};

/// Default delay between receipt queries.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default number of receipt queries before giving up (about two minutes).
pub const DEFAULT_POLL_ATTEMPTS: u32 = 60;

/// Receipt polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

/// A transaction accepted by the capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub tx_hash: String,
    /// Always `pending` on submission.
    pub status: TxStatus,
    pub explorer_url: String,
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("No wallet provider found. Please install a browser wallet such as MetaMask.")]
    NoProvider,

    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("Network setup failed: {0}")]
    NetworkSetup(String),

    #[error("Transaction submission failed: {0}")]
    Submission(String),

    #[error("Transaction {tx_hash} has no receipt after {attempts} attempts")]
    ConfirmationTimeout { tx_hash: String, attempts: u32 },

    #[error("Unexpected wallet response: {0}")]
    InvalidResponse(String),
}

/// Data carried by the anchoring transaction.
#[derive(Serialize)]
struct AnchoredPayload<'a> {
    #[serde(flatten)]
    payload: &'a HealthPayload,
    /// Submission time, unix milliseconds.
    timestamp: i64,
}

/// Encode a payload as the transaction `data` field: the UTF-8 bytes of its
/// JSON form, hex-encoded with a `0x` prefix.
pub fn encode_payload(payload: &HealthPayload, timestamp_ms: i64) -> Result<String, WalletError> {
    let bytes = serde_json::to_vec(&AnchoredPayload {
        payload,
        timestamp: timestamp_ms,
    })
    .map_err(|e| WalletError::Submission(format!("Failed to encode payload: {e}")))?;

    Ok(alloy::hex::encode_prefixed(bytes))
}

/// Map a receipt's `status` field to a terminal status.
fn receipt_status(receipt: &Value) -> TxStatus {
    match receipt.get("status").and_then(Value::as_str) {
        Some("0x1") => TxStatus::Confirmed,
        _ => TxStatus::Failed,
    }
}

fn parse_accounts(value: Value) -> Result<Vec<String>, WalletError> {
    serde_json::from_value(value)
        .map_err(|e| WalletError::InvalidResponse(format!("accounts list: {e}")))
}

/// Gateway over an optional wallet capability.
pub struct WalletGateway<P> {
    provider: Option<P>,
    network: NetworkConfig,
    poll: PollSettings,
}

impl<P: WalletProvider> WalletGateway<P> {
    /// Gateway over a present capability, targeting Sepolia.
    pub fn new(provider: P) -> Self {
        Self::from_option(Some(provider))
    }

    /// Gateway with no capability.
    pub fn absent() -> Self {
        Self::from_option(None)
    }

    pub fn from_option(provider: Option<P>) -> Self {
        Self {
            provider,
            network: SEPOLIA,
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&P, WalletError> {
        self.provider.as_ref().ok_or_else(|| {
            tracing::error!("Wallet operation attempted without a provider");
            WalletError::NoProvider
        })
    }

    /// Request account access and make sure the target network is active.
    ///
    /// Returns the primary account.
    pub async fn connect(&self) -> Result<WalletAddress, WalletError> {
        let provider = self.provider()?;

        let accounts = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|e| {
                if e.is_user_rejection() {
                    tracing::warn!(error = %e, "User declined account access");
                } else {
                    tracing::error!(code = ?e.code, error = %e, "Account access failed");
                }
                WalletError::ConnectionRejected(e.message)
            })?;

        let account = parse_accounts(accounts)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                WalletError::ConnectionRejected("no accounts were authorized".to_string())
            })?;

        self.ensure_network().await?;

        tracing::info!(account = %account, network = %self.network.name, "Wallet connected");
        Ok(WalletAddress::from(account))
    }

    /// Switch the capability to the target network, registering it first
    /// when the capability does not know it.
    pub async fn ensure_network(&self) -> Result<(), WalletError> {
        let provider = self.provider()?;

        let switched = provider
            .request("wallet_switchEthereumChain", self.network.switch_chain_params())
            .await;

        let switch_err = match switched {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        if !switch_err.is_unrecognized_chain() {
            tracing::error!(code = ?switch_err.code, error = %switch_err, "Network switch failed");
            return Err(WalletError::NetworkSetup(switch_err.message));
        }

        tracing::info!(network = %self.network.name, "Network unknown to wallet, registering it");
        provider
            .request("wallet_addEthereumChain", self.network.add_chain_params())
            .await
            .map(|_| ())
            .map_err(|e| {
                tracing::error!(code = ?e.code, error = %e, "Network registration failed");
                WalletError::NetworkSetup(format!("Failed to add {}: {}", self.network.name, e))
            })
    }

    /// Already-authorized account, without prompting. Errors read as "none".
    pub async fn connected_account(&self) -> Option<WalletAddress> {
        let provider = self.provider.as_ref()?;

        match provider.request("eth_accounts", json!([])).await {
            Ok(value) => match parse_accounts(value) {
                Ok(accounts) => accounts.into_iter().next().map(WalletAddress::from),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed eth_accounts response");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Failed to query connected accounts");
                None
            }
        }
    }

    /// Send a zero-value self-transaction carrying the encoded payload.
    pub async fn submit_transaction(
        &self,
        owner: &WalletAddress,
        payload: &HealthPayload,
    ) -> Result<SubmittedTransaction, WalletError> {
        let provider = self.provider()?;
        let data = encode_payload(payload, Utc::now().timestamp_millis())?;

        let params = json!([{
            "from": owner.as_str(),
            "to": owner.as_str(),
            "value": "0x0",
            "data": data,
            "chainId": self.network.chain_id_hex(),
        }]);

        let response = provider
            .request("eth_sendTransaction", params)
            .await
            .map_err(|e| {
                tracing::error!(owner = %owner, code = ?e.code, error = %e, "Transaction rejected");
                WalletError::Submission(e.message)
            })?;

        let tx_hash = response
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::InvalidResponse(format!("transaction hash: {response}")))?;

        tracing::info!(owner = %owner, tx_hash = %tx_hash, "Transaction submitted");
        Ok(SubmittedTransaction {
            explorer_url: self.network.tx_url(&tx_hash),
            tx_hash,
            status: TxStatus::Pending,
        })
    }

    /// Poll for the receipt of `tx_hash` until it appears or the attempt
    /// budget runs out. Query errors count as attempts and are retried.
    pub async fn poll_for_outcome(&self, tx_hash: &str) -> Result<TxStatus, WalletError> {
        let provider = self.provider()?;
        let max_attempts = self.poll.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match provider
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .await
            {
                Ok(Value::Null) => {
                    tracing::debug!(tx_hash, attempt, "No receipt yet");
                }
                Ok(receipt) => {
                    let status = receipt_status(&receipt);
                    tracing::info!(tx_hash, attempt, status = %status, "Receipt received");
                    return Ok(status);
                }
                Err(e) => {
                    tracing::warn!(tx_hash, attempt, error = %e, "Receipt query failed, retrying");
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        tracing::error!(tx_hash, attempts = max_attempts, "Gave up waiting for receipt");
        Err(WalletError::ConfirmationTimeout {
            tx_hash: tx_hash.to_string(),
            attempts: max_attempts,
        })
    }

    /// Account and chain notifications, if a capability is present.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.provider.as_ref().map(|provider| provider.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::provider::{ProviderError, UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};
    use crate::blockchain::testing::ScriptedProvider;
    use crate::models::MetricKind;
    use std::sync::Arc;

    const OWNER: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn fast_poll(max_attempts: u32) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(1),
            max_attempts,
        }
    }

    fn gateway(provider: ScriptedProvider) -> (WalletGateway<Arc<ScriptedProvider>>, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        (
            WalletGateway::new(provider.clone()).with_poll_settings(fast_poll(5)),
            provider,
        )
    }

    #[test]
    fn encode_payload_is_prefixed_hex_of_json() {
        let payload = HealthPayload::metric(MetricKind::HeartRate, 72, "bpm");
        let encoded = encode_payload(&payload, 1_700_000_000_000).unwrap();

        assert!(encoded.starts_with("0x"));
        let bytes = alloy::hex::decode(&encoded).unwrap();
        assert_eq!(bytes.len() * 2 + 2, encoded.len());

        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json,
            json!({
                "dataType": "heartRate",
                "value": 72,
                "unit": "bpm",
                "timestamp": 1_700_000_000_000i64
            })
        );
    }

    #[test]
    fn encode_payload_uses_utf8_bytes() {
        let payload = HealthPayload::metric(MetricKind::Weight, 70, "kg·");
        let encoded = encode_payload(&payload, 0).unwrap();
        let bytes = alloy::hex::decode(&encoded).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("kg·"));
    }

    #[tokio::test]
    async fn absent_provider_fails_every_operation_but_account_query() {
        let gateway = WalletGateway::<ScriptedProvider>::absent();
        let owner = WalletAddress::from(OWNER);
        let payload = HealthPayload::metric(MetricKind::Steps, 1000, "steps");

        assert!(!gateway.is_available());
        assert_eq!(gateway.connect().await.unwrap_err(), WalletError::NoProvider);
        assert_eq!(
            gateway.submit_transaction(&owner, &payload).await.unwrap_err(),
            WalletError::NoProvider
        );
        assert_eq!(
            gateway.poll_for_outcome("0xabc").await.unwrap_err(),
            WalletError::NoProvider
        );
        assert!(gateway.connected_account().await.is_none());
        assert!(gateway.subscribe().is_none());
    }

    #[tokio::test]
    async fn connect_returns_first_account_and_switches_network() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new()
                .reply("eth_requestAccounts", Ok(json!([OWNER, "0xother"])))
                .reply("wallet_switchEthereumChain", Ok(Value::Null)),
        );

        let account = gateway.connect().await.unwrap();
        assert_eq!(account.as_str(), OWNER);

        let calls = provider.calls();
        assert_eq!(calls[1].0, "wallet_switchEthereumChain");
        assert_eq!(calls[1].1, json!([{ "chainId": "0xaa36a7" }]));
        assert_eq!(provider.calls_to("wallet_addEthereumChain"), 0);
    }

    #[tokio::test]
    async fn connect_registers_unknown_network() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new()
                .reply("eth_requestAccounts", Ok(json!([OWNER])))
                .reply(
                    "wallet_switchEthereumChain",
                    Err(ProviderError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID")),
                )
                .reply("wallet_addEthereumChain", Ok(Value::Null)),
        );

        gateway.connect().await.unwrap();
        assert_eq!(provider.calls_to("wallet_addEthereumChain"), 1);
    }

    #[tokio::test]
    async fn connect_reports_network_setup_failure() {
        let (gateway, _) = gateway(
            ScriptedProvider::new()
                .reply("eth_requestAccounts", Ok(json!([OWNER])))
                .reply(
                    "wallet_switchEthereumChain",
                    Err(ProviderError::new(UNRECOGNIZED_CHAIN, "Unrecognized chain ID")),
                )
                .reply(
                    "wallet_addEthereumChain",
                    Err(ProviderError::new(USER_REJECTED_REQUEST, "User rejected")),
                ),
        );

        let err = gateway.connect().await.unwrap_err();
        assert!(matches!(err, WalletError::NetworkSetup(_)));

        let (gateway, _) = gateway_with_switch_error();
        assert!(matches!(
            gateway.connect().await.unwrap_err(),
            WalletError::NetworkSetup(_)
        ));
    }

    fn gateway_with_switch_error() -> (WalletGateway<Arc<ScriptedProvider>>, Arc<ScriptedProvider>) {
        gateway(
            ScriptedProvider::new()
                .reply("eth_requestAccounts", Ok(json!([OWNER])))
                .reply(
                    "wallet_switchEthereumChain",
                    Err(ProviderError::new(-32603, "Internal error")),
                ),
        )
    }

    #[tokio::test]
    async fn connect_rejected_by_user() {
        let (gateway, provider) = gateway(ScriptedProvider::new().reply(
            "eth_requestAccounts",
            Err(ProviderError::new(USER_REJECTED_REQUEST, "User rejected the request.")),
        ));

        let err = gateway.connect().await.unwrap_err();
        assert_eq!(
            err,
            WalletError::ConnectionRejected("User rejected the request.".into())
        );
        assert_eq!(provider.calls_to("wallet_switchEthereumChain"), 0);

        let (gateway, _) =
            self::gateway(ScriptedProvider::new().reply("eth_requestAccounts", Ok(json!([]))));
        assert!(matches!(
            gateway.connect().await.unwrap_err(),
            WalletError::ConnectionRejected(_)
        ));
    }

    #[tokio::test]
    async fn connected_account_swallows_errors_without_prompting() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new()
                .reply("eth_accounts", Ok(json!([OWNER])))
                .reply("eth_accounts", Ok(json!([])))
                .reply("eth_accounts", Err(ProviderError::other("transport closed"))),
        );

        assert_eq!(gateway.connected_account().await.unwrap().as_str(), OWNER);
        assert!(gateway.connected_account().await.is_none());
        assert!(gateway.connected_account().await.is_none());
        assert_eq!(provider.calls_to("eth_requestAccounts"), 0);
        assert_eq!(provider.calls_to("wallet_switchEthereumChain"), 0);
    }

    #[tokio::test]
    async fn submit_sends_zero_value_self_transaction() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new().reply("eth_sendTransaction", Ok(json!("0xfeed"))),
        );
        let owner = WalletAddress::from(OWNER);
        let payload = HealthPayload::metric(MetricKind::Glucose, 95, "mg/dL");

        let submitted = gateway.submit_transaction(&owner, &payload).await.unwrap();
        assert_eq!(submitted.tx_hash, "0xfeed");
        assert_eq!(submitted.status, TxStatus::Pending);
        assert_eq!(submitted.explorer_url, "https://sepolia.etherscan.io/tx/0xfeed");

        let (method, params) = provider.calls().remove(0);
        assert_eq!(method, "eth_sendTransaction");
        let tx = &params[0];
        assert_eq!(tx["from"], OWNER);
        assert_eq!(tx["to"], OWNER);
        assert_eq!(tx["value"], "0x0");
        assert_eq!(tx["chainId"], "0xaa36a7");

        let data = alloy::hex::decode(tx["data"].as_str().unwrap()).unwrap();
        let decoded: Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(decoded["dataType"], "glucose");
        assert_eq!(decoded["value"], 95);
        assert!(decoded["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn submit_wraps_rejection() {
        let (gateway, _) = gateway(ScriptedProvider::new().reply(
            "eth_sendTransaction",
            Err(ProviderError::new(USER_REJECTED_REQUEST, "User denied transaction signature.")),
        ));
        let err = gateway
            .submit_transaction(
                &WalletAddress::from(OWNER),
                &HealthPayload::metric(MetricKind::Sleep, 7, "hours"),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::Submission("User denied transaction signature.".into())
        );
    }

    #[tokio::test]
    async fn poll_stops_at_failed_receipt_on_third_attempt() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new()
                .reply("eth_getTransactionReceipt", Ok(Value::Null))
                .reply("eth_getTransactionReceipt", Ok(Value::Null))
                .reply("eth_getTransactionReceipt", Ok(json!({ "status": "0x0" })))
                .reply_always("eth_getTransactionReceipt", Ok(json!({ "status": "0x1" }))),
        );

        let status = gateway.poll_for_outcome("0xfeed").await.unwrap();
        assert_eq!(status, TxStatus::Failed);
        assert_eq!(provider.calls_to("eth_getTransactionReceipt"), 3);
    }

    #[tokio::test]
    async fn poll_retries_query_errors_then_confirms() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new()
                .reply(
                    "eth_getTransactionReceipt",
                    Err(ProviderError::other("network hiccup")),
                )
                .reply("eth_getTransactionReceipt", Ok(json!({ "status": "0x1" }))),
        );

        let status = gateway.poll_for_outcome("0xfeed").await.unwrap();
        assert_eq!(status, TxStatus::Confirmed);
        assert_eq!(provider.calls_to("eth_getTransactionReceipt"), 2);
    }

    #[tokio::test]
    async fn poll_times_out_after_attempt_budget() {
        let (gateway, provider) = gateway(
            ScriptedProvider::new().reply_always("eth_getTransactionReceipt", Ok(Value::Null)),
        );

        let err = gateway.poll_for_outcome("0xfeed").await.unwrap_err();
        assert_eq!(
            err,
            WalletError::ConfirmationTimeout {
                tx_hash: "0xfeed".into(),
                attempts: 5
            }
        );
        assert_eq!(provider.calls_to("eth_getTransactionReceipt"), 5);
    }

    #[test]
    fn default_poll_settings_cover_two_minutes() {
        let settings = PollSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(2));
        assert_eq!(settings.max_attempts, 60);
    }
}
