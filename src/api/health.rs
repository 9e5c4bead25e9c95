// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness response with the number of records held in memory.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Records currently stored (`null` if the store could not be read).
    pub records: Option<usize>,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness(State(state): State<AppState>) -> Json<HealthResponse> {
    let records = state.store.read().await.count().ok();

    Json(HealthResponse {
        status: "ok".to_string(),
        records,
    })
}
