// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory health record store.
//!
//! Records live for the lifetime of the process. The store is reached through
//! the [`HealthRecordStore`] trait so a persistent backend can replace it
//! without touching the API layer.
//!
//! ## Lifecycle rules
//!
//! - A record is created `pending` with no transaction hash.
//! - `pending` may be re-applied while pending (this is how the hash is attached).
//! - `pending -> confirmed | failed` happens once; terminal records only accept
//!   an identical re-application.
//! - A hash, once set, is never replaced.
//! - Records are never deleted.

use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use crate::models::{CreateHealthRecordRequest, HealthRecord, TxStatus, WalletAddress};

/// Errors raised by a record store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record {id} is already {current}; cannot move to {requested}")]
    InvalidTransition {
        id: String,
        current: TxStatus,
        requested: TxStatus,
    },

    #[error("Record {id} already carries transaction {existing}")]
    HashAlreadySet { id: String, existing: String },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The four record operations the API layer depends on.
pub trait HealthRecordStore: Send + Sync {
    /// Insert a new pending record. The request is assumed validated.
    fn create(&mut self, request: CreateHealthRecordRequest) -> StoreResult<HealthRecord>;

    /// Records owned by `owner` (case-insensitive), newest first.
    fn list_by_owner(&self, owner: &WalletAddress) -> StoreResult<Vec<HealthRecord>>;

    /// Set hash and status on a record. `Ok(None)` when the id is unknown.
    fn update_transaction(
        &mut self,
        id: &str,
        tx_hash: &str,
        tx_status: TxStatus,
    ) -> StoreResult<Option<HealthRecord>>;

    /// Every record, newest first.
    fn list_all(&self) -> StoreResult<Vec<HealthRecord>>;

    /// Number of stored records.
    fn count(&self) -> StoreResult<usize>;
}

#[derive(Default)]
pub struct InMemoryStore {
    /// Insertion order; sorting is stable so equal timestamps keep this order.
    records: Vec<HealthRecord>,
    index: HashMap<String, usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn newest_first<'a>(records: impl Iterator<Item = &'a HealthRecord>) -> Vec<HealthRecord> {
        let mut sorted: Vec<HealthRecord> = records.cloned().collect();
        sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        sorted
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }
}

impl HealthRecordStore for InMemoryStore {
    fn create(&mut self, request: CreateHealthRecordRequest) -> StoreResult<HealthRecord> {
        let record = HealthRecord {
            id: self.fresh_id(),
            wallet_address: request.wallet_address.normalized(),
            payload: request.payload,
            tx_hash: None,
            tx_status: TxStatus::Pending,
            timestamp: Utc::now(),
        };

        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record.clone());
        Ok(record)
    }

    fn list_by_owner(&self, owner: &WalletAddress) -> StoreResult<Vec<HealthRecord>> {
        Ok(Self::newest_first(
            self.records
                .iter()
                .filter(|record| record.wallet_address.matches(owner)),
        ))
    }

    fn update_transaction(
        &mut self,
        id: &str,
        tx_hash: &str,
        tx_status: TxStatus,
    ) -> StoreResult<Option<HealthRecord>> {
        let Some(&slot) = self.index.get(id) else {
            return Ok(None);
        };
        let record = &mut self.records[slot];

        if let Some(existing) = &record.tx_hash {
            if existing != tx_hash {
                return Err(StoreError::HashAlreadySet {
                    id: id.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        if record.tx_status.is_terminal() && record.tx_status != tx_status {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                current: record.tx_status,
                requested: tx_status,
            });
        }

        record.tx_hash = Some(tx_hash.to_string());
        record.tx_status = tx_status;
        Ok(Some(record.clone()))
    }

    fn list_all(&self) -> StoreResult<Vec<HealthRecord>> {
        Ok(Self::newest_first(self.records.iter()))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.len())
    }
}
