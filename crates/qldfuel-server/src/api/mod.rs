mod control;
mod prices;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use qldfuel_client::FuelPriceClient;
use qldfuel_core::IntegrationSettings;
use qldfuel_engine::{Coordinator, SensorHub};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator<FuelPriceClient>>,
    pub sensors: Arc<SensorHub>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    last_success_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    refreshing: bool,
    scheduled: bool,
    sensors: usize,
    settings: IntegrationSettings,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "update_failed" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/snapshot", get(prices::get_snapshot))
        .route("/api/v1/sensors", get(prices::list_sensors))
        .route("/api/v1/best-prices", get(prices::list_best_prices))
        .route("/api/v1/refresh", post(control::trigger_refresh))
        .route("/api/v1/settings", put(control::update_settings))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

/// `ok` once a snapshot is published and the last refresh succeeded,
/// `stale` while serving an older snapshot after a failure, `empty` before
/// the first success.
async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let status = state.coordinator.status().await;
    let label = match (status.has_snapshot, status.last_error.is_some()) {
        (false, _) => "empty",
        (true, true) => "stale",
        (true, false) => "ok",
    };
    let code = if status.has_snapshot {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    if !status.has_snapshot {
        tracing::warn!(last_error = ?status.last_error, "health check: no snapshot published");
    }

    (
        code,
        Json(ApiResponse {
            data: HealthData {
                status: label,
                last_success_at: status.last_success_at,
                last_error: status.last_error,
                refreshing: status.refreshing,
                scheduled: status.scheduled,
                sensors: state.sensors.sensor_count(),
                settings: status.settings,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
