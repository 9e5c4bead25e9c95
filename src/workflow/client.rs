// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTTP client for the health data API.

use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};

use super::{RecordService, RecordServiceError};
use crate::models::{
    CreateHealthRecordRequest, HealthRecord, TxStatus, UpdateTransactionRequest, WalletAddress,
};

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for a running SafeStat server.
#[derive(Clone)]
pub struct HealthDataClient {
    http: Client,
    base_url: url::Url,
}

impl HealthDataClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:5000`).
    pub fn new(base_url: &str) -> Result<Self, RecordServiceError> {
        let base_url = url::Url::parse(base_url)
            .map_err(|e| RecordServiceError::Transport(format!("Invalid API URL: {e}")))?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<url::Url, RecordServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RecordServiceError::Transport("API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "health-data"])
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RecordServiceError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| RecordServiceError::Transport(format!("Invalid response body: {e}")));
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        };
        Err(RecordServiceError::from_status(status, message))
    }

    /// `GET /api/health-data`
    pub async fn list_all(&self) -> Result<Vec<HealthRecord>, RecordServiceError> {
        let response = self
            .http
            .get(self.endpoint(&[])?)
            .send()
            .await
            .map_err(RecordServiceError::transport)?;
        Self::decode(response).await
    }
}

impl RecordServiceError {
    fn transport(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl RecordService for HealthDataClient {
    async fn create(
        &self,
        request: CreateHealthRecordRequest,
    ) -> Result<HealthRecord, RecordServiceError> {
        let response = self
            .http
            .post(self.endpoint(&[])?)
            .json(&request)
            .send()
            .await
            .map_err(RecordServiceError::transport)?;
        Self::decode(response).await
    }

    async fn update_transaction(
        &self,
        id: &str,
        tx_hash: &str,
        tx_status: TxStatus,
    ) -> Result<HealthRecord, RecordServiceError> {
        let response = self
            .http
            .patch(self.endpoint(&[id, "transaction"])?)
            .json(&UpdateTransactionRequest::new(tx_hash, tx_status))
            .send()
            .await
            .map_err(RecordServiceError::transport)?;
        Self::decode(response).await
    }

    async fn list_by_owner(
        &self,
        owner: &WalletAddress,
    ) -> Result<Vec<HealthRecord>, RecordServiceError> {
        let response = self
            .http
            .get(self.endpoint(&[owner.as_str()])?)
            .send()
            .await
            .map_err(RecordServiceError::transport)?;
        Self::decode(response).await
    }
}
