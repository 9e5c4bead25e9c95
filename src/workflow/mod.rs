// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Submission workflow.
//!
//! Drives one health data submission end to end:
//!
//! ```text
//! idle -> recordPersisted -> transactionSent -> polling -> confirmed | failed
//! ```
//!
//! Any failure before a receipt is obtained moves straight to `failed`; the
//! workflow never retries on its own. Records are reached through
//! [`RecordService`], either over HTTP ([`HealthDataClient`]) or in-process
//! ([`AppState`]).

pub mod client;

use std::future::Future;

use axum::http::StatusCode;
use serde::Serialize;

use crate::{
    blockchain::{WalletGateway, WalletProvider},
    error::ApiError,
    models::{CreateHealthRecordRequest, HealthPayload, HealthRecord, TxStatus, WalletAddress},
    state::AppState,
};

pub use client::HealthDataClient;

/// Errors returned by a [`RecordService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordServiceError {
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),
}

impl RecordServiceError {
    pub(crate) fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::Rejected(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            _ => Self::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<ApiError> for RecordServiceError {
    fn from(err: ApiError) -> Self {
        Self::from_status(err.status, err.message)
    }
}

/// The record operations the workflow needs.
pub trait RecordService: Send + Sync {
    fn create(
        &self,
        request: CreateHealthRecordRequest,
    ) -> impl Future<Output = Result<HealthRecord, RecordServiceError>> + Send;

    fn update_transaction(
        &self,
        id: &str,
        tx_hash: &str,
        tx_status: TxStatus,
    ) -> impl Future<Output = Result<HealthRecord, RecordServiceError>> + Send;

    fn list_by_owner(
        &self,
        owner: &WalletAddress,
    ) -> impl Future<Output = Result<Vec<HealthRecord>, RecordServiceError>> + Send;
}

/// In-process access with the same validation as the HTTP handlers.
impl RecordService for AppState {
    async fn create(
        &self,
        request: CreateHealthRecordRequest,
    ) -> Result<HealthRecord, RecordServiceError> {
        request.validate().map_err(ApiError::from)?;
        let record = self
            .store
            .write()
            .await
            .create(request)
            .map_err(ApiError::from)?;
        Ok(record)
    }

    async fn update_transaction(
        &self,
        id: &str,
        tx_hash: &str,
        tx_status: TxStatus,
    ) -> Result<HealthRecord, RecordServiceError> {
        if tx_hash.is_empty() {
            return Err(RecordServiceError::Rejected(
                "txHash and txStatus are required".into(),
            ));
        }
        self.store
            .write()
            .await
            .update_transaction(id, tx_hash, tx_status)
            .map_err(ApiError::from)?
            .ok_or_else(|| RecordServiceError::NotFound("Health data not found".into()))
    }

    async fn list_by_owner(
        &self,
        owner: &WalletAddress,
    ) -> Result<Vec<HealthRecord>, RecordServiceError> {
        let records = self
            .store
            .read()
            .await
            .list_by_owner(owner)
            .map_err(ApiError::from)?;
        Ok(records)
    }
}

/// Workflow states, in the order a successful submission visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionState {
    Idle,
    RecordPersisted,
    TransactionSent,
    Polling,
    Confirmed,
    Failed,
}

/// What happened to one submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
    /// Every state visited, starting with `idle`.
    pub states: Vec<SubmissionState>,
    pub record_id: Option<String>,
    pub tx_hash: Option<String>,
    pub explorer_url: Option<String>,
    /// Message shown to the user when something went wrong.
    pub error: Option<String>,
    /// The owner's records after the submission settled.
    pub records: Option<Vec<HealthRecord>>,
}

impl SubmissionReport {
    fn new() -> Self {
        Self {
            states: vec![SubmissionState::Idle],
            record_id: None,
            tx_hash: None,
            explorer_url: None,
            error: None,
            records: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.states
            .last()
            .copied()
            .unwrap_or(SubmissionState::Idle)
    }

    pub fn is_confirmed(&self) -> bool {
        self.state() == SubmissionState::Confirmed
    }

    fn advance(&mut self, state: SubmissionState) {
        tracing::debug!(from = ?self.state(), to = ?state, "Submission state change");
        self.states.push(state);
    }

    fn fail(&mut self, error: impl ToString) {
        let message = error.to_string();
        tracing::error!(
            record_id = ?self.record_id,
            tx_hash = ?self.tx_hash,
            error = %message,
            "Submission failed"
        );
        self.error = Some(message);
        self.advance(SubmissionState::Failed);
    }
}

/// Orchestrates the record service and the wallet gateway for one owner.
pub struct SubmissionWorkflow<'a, P, R> {
    gateway: &'a WalletGateway<P>,
    records: &'a R,
}

impl<'a, P: WalletProvider, R: RecordService> SubmissionWorkflow<'a, P, R> {
    pub fn new(gateway: &'a WalletGateway<P>, records: &'a R) -> Self {
        Self { gateway, records }
    }

    /// Run one submission to a terminal state.
    ///
    /// Never returns an error: failures are reported in the returned
    /// [`SubmissionReport`] so the caller can show them.
    pub async fn submit(&self, owner: &WalletAddress, payload: HealthPayload) -> SubmissionReport {
        let mut report = SubmissionReport::new();
        self.run(owner, payload, &mut report).await;

        if report.record_id.is_some() {
            match self.records.list_by_owner(owner).await {
                Ok(records) => report.records = Some(records),
                Err(e) => tracing::warn!(owner = %owner, error = %e, "Failed to refresh records"),
            }
        }
        report
    }

    async fn run(&self, owner: &WalletAddress, payload: HealthPayload, report: &mut SubmissionReport) {
        let record = match self
            .records
            .create(CreateHealthRecordRequest::new(owner.clone(), payload.clone()))
            .await
        {
            Ok(record) => record,
            Err(e) => return report.fail(e),
        };
        report.record_id = Some(record.id.clone());
        report.advance(SubmissionState::RecordPersisted);

        let sent = match self.gateway.submit_transaction(owner, &payload).await {
            Ok(sent) => sent,
            Err(e) => return report.fail(e),
        };
        report.tx_hash = Some(sent.tx_hash.clone());
        report.explorer_url = Some(sent.explorer_url.clone());

        if let Err(e) = self
            .records
            .update_transaction(&record.id, &sent.tx_hash, TxStatus::Pending)
            .await
        {
            return report.fail(e);
        }
        report.advance(SubmissionState::TransactionSent);

        report.advance(SubmissionState::Polling);
        let outcome = match self.gateway.poll_for_outcome(&sent.tx_hash).await {
            Ok(outcome) => outcome,
            Err(e) => return report.fail(e),
        };

        // The receipt is authoritative; a failed write only gets reported.
        if let Err(e) = self
            .records
            .update_transaction(&record.id, &sent.tx_hash, outcome)
            .await
        {
            tracing::warn!(record_id = %record.id, error = %e, "Failed to persist outcome");
            report.error = Some(e.to_string());
        }

        match outcome {
            TxStatus::Confirmed => {
                tracing::info!(record_id = %record.id, tx_hash = %sent.tx_hash, "Submission confirmed");
                report.advance(SubmissionState::Confirmed);
            }
            _ => {
                if report.error.is_none() {
                    report.error = Some("Transaction reverted".to_string());
                }
                tracing::warn!(record_id = %record.id, tx_hash = %sent.tx_hash, "Transaction reverted");
                report.advance(SubmissionState::Failed);
            }
        }
    }
}
