// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Health data endpoints.
//!
//! Thin validating adapters over the record store. Each handler checks its
//! input, takes the store lock for a single operation and returns the
//! resulting record(s).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use crate::{
    error::ApiError,
    models::{CreateHealthRecordRequest, HealthRecord, UpdateTransactionRequest, WalletAddress},
    state::AppState,
};

/// Record a new health data submission.
///
/// The record starts `pending` with no transaction hash.
#[utoipa::path(
    post,
    path = "/api/health-data",
    request_body = CreateHealthRecordRequest,
    tag = "Health Data",
    responses(
        (status = 200, description = "Record created", body = HealthRecord),
        (status = 400, description = "Schema violation")
    )
)]
pub async fn create_health_data(
    State(state): State<AppState>,
    body: Result<Json<CreateHealthRecordRequest>, JsonRejection>,
) -> Result<Json<HealthRecord>, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let record = state.store.write().await.create(request)?;

    tracing::info!(
        record_id = %record.id,
        wallet = %record.wallet_address,
        data = %record.payload.label(),
        "Health data recorded"
    );
    Ok(Json(record))
}

/// List a wallet's records, newest first.
#[utoipa::path(
    get,
    path = "/api/health-data/{key}",
    params(
        ("key" = String, Path, description = "Owner wallet address (case-insensitive)")
    ),
    tag = "Health Data",
    responses(
        (status = 200, description = "Records of the wallet (possibly empty)", body = [HealthRecord]),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_health_data_by_wallet(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<Vec<HealthRecord>>, ApiError> {
    let owner = WalletAddress::from(wallet_address);
    let records = state.store.read().await.list_by_owner(&owner)?;
    Ok(Json(records))
}

/// Attach a transaction hash to a record or advance its status.
#[utoipa::path(
    patch,
    path = "/api/health-data/{key}/transaction",
    params(
        ("key" = String, Path, description = "Record identifier")
    ),
    request_body = UpdateTransactionRequest,
    tag = "Health Data",
    responses(
        (status = 200, description = "Record updated", body = HealthRecord),
        (status = 400, description = "txHash or txStatus missing or invalid"),
        (status = 404, description = "Unknown record"),
        (status = 409, description = "Status or hash cannot change anymore"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateTransactionRequest>, JsonRejection>,
) -> Result<Json<HealthRecord>, ApiError> {
    let Json(request) = body?;
    let (tx_hash, tx_status) = request.parse()?;

    let updated = state
        .store
        .write()
        .await
        .update_transaction(&id, &tx_hash, tx_status)?
        .ok_or_else(|| ApiError::not_found("Health data not found"))?;

    tracing::info!(
        record_id = %updated.id,
        tx_hash = %tx_hash,
        status = %tx_status,
        "Transaction status updated"
    );
    Ok(Json(updated))
}

/// List every record, newest first.
#[utoipa::path(
    get,
    path = "/api/health-data",
    tag = "Health Data",
    responses(
        (status = 200, description = "All records", body = [HealthRecord]),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_health_data(
    State(state): State<AppState>,
) -> Result<Json<Vec<HealthRecord>>, ApiError> {
    let records = state.store.read().await.list_all()?;
    Ok(Json(records))
}
