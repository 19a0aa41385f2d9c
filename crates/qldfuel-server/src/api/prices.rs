use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use qldfuel_engine::{BestPriceReading, FuelPriceReading, Scope};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct BestPricesQuery {
    pub scope: Option<String>,
}

pub(super) async fn get_snapshot(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Response, ApiError> {
    let Some(snapshot) = state.coordinator.snapshot() else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "no price snapshot has been published yet",
        ));
    };

    Ok(Json(ApiResponse {
        data: snapshot.as_ref(),
        meta: ResponseMeta::new(req_id.0),
    })
    .into_response())
}

/// Fuel price sensor readings; empty until the first snapshot.
pub(super) async fn list_sensors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<FuelPriceReading>>> {
    let data = state
        .coordinator
        .snapshot()
        .map(|snapshot| state.sensors.fuel_readings(&snapshot))
        .unwrap_or_default();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn list_best_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BestPricesQuery>,
) -> Result<Json<ApiResponse<Vec<BestPriceReading>>>, ApiError> {
    let scope = match query.scope.as_deref() {
        Some(raw) => Some(
            raw.parse::<Scope>()
                .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?,
        ),
        None => None,
    };

    let data = state
        .coordinator
        .snapshot()
        .map(|snapshot| state.sensors.best_price_readings(&snapshot))
        .unwrap_or_default()
        .into_iter()
        .filter(|reading| scope.is_none_or(|s| reading.scope == s))
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
