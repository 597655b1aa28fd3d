//! Read-only traffic statistics for the dashboard.

use axum::extract::{Json, Path, State};

use edgeguard_service::StatsRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// Live traffic counters.
///
/// All fields read as zero before any traffic has been classified.
#[utoipa::path(
    get,
    path = "/_edgeguard/stats",
    responses(
        (status = 200, description = "Live counters", body = StatsRecord),
        (status = 503, description = "Counter store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "Stats"
)]
pub async fn live_stats(State(state): State<AppState>) -> Result<Json<StatsRecord>, ApiError> {
    let record = state.stats().read_stats().await?;
    Ok(Json(record))
}

/// Counters of one UTC hour (0-23).
///
/// Only populated when hourly stats are enabled.
#[utoipa::path(
    get,
    path = "/_edgeguard/stats/hour/{hour}",
    params(
        ("hour" = u8, Path, description = "UTC hour of day, 0-23"),
    ),
    responses(
        (status = 200, description = "Counters of the hour bucket", body = StatsRecord),
        (status = 400, description = "Hour out of range", body = crate::error::ErrorBody),
        (status = 503, description = "Counter store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "Stats"
)]
pub async fn hour_stats(
    State(state): State<AppState>,
    Path(hour): Path<u8>,
) -> Result<Json<StatsRecord>, ApiError> {
    if hour > 23 {
        return Err(ApiError::BadRequest(format!(
            "hour must be between 0 and 23, got {hour}"
        )));
    }
    let record = state.stats().read_hour(hour).await?;
    Ok(Json(record))
}
