// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, Request},
    routing::{get, patch},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        CreateHealthRecordRequest, HealthPayload, HealthProfile, HealthRecord, MetricKind,
        MetricReading, TxStatus, UpdateTransactionRequest, WalletAddress,
    },
    state::AppState,
};

pub mod health;
pub mod health_data;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    // The owner lookup and the transaction update share the second path
    // segment, so both routes must use the same parameter name for it.
    let api_routes = Router::new()
        .route(
            "/health-data",
            get(health_data::list_health_data).post(health_data::create_health_data),
        )
        .route(
            "/health-data/{key}",
            get(health_data::list_health_data_by_wallet),
        )
        .route(
            "/health-data/{key}/transaction",
            patch(health_data::update_transaction),
        );

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_data::create_health_data,
        health_data::list_health_data_by_wallet,
        health_data::update_transaction,
        health_data::list_health_data,
        health::liveness
    ),
    components(
        schemas(
            HealthRecord,
            HealthPayload,
            MetricReading,
            MetricKind,
            HealthProfile,
            TxStatus,
            WalletAddress,
            CreateHealthRecordRequest,
            UpdateTransactionRequest,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Health Data", description = "Health metric submissions and their transactions"),
        (name = "Health", description = "Service liveness")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[test]
    fn openapi_paths_use_router_parameter_names() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/health-data",
            "/api/health-data/{key}",
            "/api/health-data/{key}/transaction",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing documented path {path}");
        }
        assert!(!paths.keys().any(|path| path.contains("{wallet_address}") || path.contains("{id}")));
    }

    #[tokio::test]
    async fn create_then_confirm_round_trip() {
        let app = router(AppState::default());

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/health-data",
            Some(json!({
                "metricKind": "heartRate",
                "value": 72,
                "unit": "bpm",
                "ownerAddress": "0xABC0000000000000000000000000000000000001",
                "transactionStatus": "pending",
                "transactionHash": null
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_string();
        assert!(created["timestamp"].is_string());
        assert_eq!(created["txStatus"], "pending");

        let (status, updated) = send(
            &app,
            Method::PATCH,
            &format!("/api/health-data/{id}/transaction"),
            Some(json!({ "txHash": "0xdeadbeef", "txStatus": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["txHash"], "0xdeadbeef");
        assert_eq!(updated["txStatus"], "confirmed");
        for field in ["id", "walletAddress", "dataType", "value", "unit", "timestamp"] {
            assert_eq!(updated[field], created[field], "field {field} changed");
        }

        let (status, listed) = send(
            &app,
            Method::GET,
            "/api/health-data/0xabc0000000000000000000000000000000000001",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed, json!([updated]));
    }

    #[tokio::test]
    async fn negative_value_is_bad_request_and_not_persisted() {
        let app = router(AppState::default());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/health-data",
            Some(json!({
                "walletAddress": "0xabc",
                "dataType": "glucose",
                "value": -5,
                "unit": "mg/dL"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (_, all) = send(&app, Method::GET, "/api/health-data", None).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = router(AppState::default());

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/health-data",
            Some(json!({ "walletAddress": "0xabc", "dataType": "heartRate" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_unknown_id_is_not_found_and_missing_fields_bad_request() {
        let app = router(AppState::default());

        let (status, _) = send(
            &app,
            Method::PATCH,
            "/api/health-data/7f1c2a9e-0000-4000-8000-000000000000/transaction",
            Some(json!({ "txHash": "0xdeadbeef", "txStatus": "confirmed" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            Method::PATCH,
            "/api/health-data/whatever/transaction",
            Some(json!({ "txHash": "0xdeadbeef" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "txHash and txStatus are required");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(AppState::default());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }
}
