use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use qldfuel_core::{FuelType, IntegrationSettings};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct RefreshData {
    fetched_at: DateTime<Utc>,
    sites: usize,
    fuels: usize,
}

/// Partial settings update. Omitted fields keep their current value; fuel
/// types are API fuel ids.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SettingsUpdate {
    pub radius_km: Option<u32>,
    pub fuel_types: Option<Vec<String>>,
    pub scan_interval_hours: Option<u32>,
}

impl SettingsUpdate {
    fn apply(self, current: &IntegrationSettings) -> Result<IntegrationSettings, String> {
        let fuel_types = match self.fuel_types {
            Some(ids) => ids
                .iter()
                .map(|id| {
                    FuelType::from_id(id.trim()).ok_or_else(|| format!("unknown fuel id '{id}'"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => current.fuel_types().to_vec(),
        };

        IntegrationSettings::new(
            self.radius_km.unwrap_or(current.radius_km()),
            fuel_types,
            self.scan_interval_hours
                .unwrap_or(current.scan_interval_hours()),
        )
        .map_err(|e| e.to_string())
    }
}

/// Runs a refresh, or joins the one already in flight.
pub(super) async fn trigger_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RefreshData>>, ApiError> {
    let snapshot = state
        .coordinator
        .refresh()
        .await
        .map_err(|e| ApiError::new(req_id.0.clone(), "update_failed", e.to_string()))?;

    Ok(Json(ApiResponse {
        data: RefreshData {
            fetched_at: snapshot.fetched_at,
            sites: snapshot.sites.len(),
            fuels: snapshot.global_cheapest.len(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<IntegrationSettings>>, ApiError> {
    let settings = update
        .apply(&state.coordinator.settings())
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e))?;

    state
        .coordinator
        .reconfigure(settings.clone())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "settings: reconfigure failed");
            ApiError::new(req_id.0.clone(), "internal_error", "failed to apply settings")
        })?;

    Ok(Json(ApiResponse {
        data: settings,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_fields_keep_current_values() {
        let current = IntegrationSettings::default();
        let update = SettingsUpdate {
            radius_km: Some(20),
            ..SettingsUpdate::default()
        };

        let next = update.apply(&current).unwrap();

        assert_eq!(next.radius_km(), 20);
        assert_eq!(next.fuel_types(), current.fuel_types());
        assert_eq!(next.scan_interval_hours(), current.scan_interval_hours());
    }

    #[test]
    fn unknown_fuel_id_is_rejected() {
        let update = SettingsUpdate {
            fuel_types: Some(vec!["12".to_string(), "999".to_string()]),
            ..SettingsUpdate::default()
        };

        let err = update.apply(&IntegrationSettings::default()).unwrap_err();
        assert!(err.contains("999"), "{err}");
    }

    #[test]
    fn out_of_range_radius_is_rejected() {
        let update = SettingsUpdate {
            radius_km: Some(0),
            ..SettingsUpdate::default()
        };

        assert!(update.apply(&IntegrationSettings::default()).is_err());
    }
}
