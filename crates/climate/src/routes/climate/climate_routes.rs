use axum::{
    extract::{Path, State},
    Json,
};
use std::{collections::BTreeMap, sync::Arc};

use crate::{format_date, AggregateResult, AppState, QueryError, TemperatureObservation};

#[utoipa::path(
    get,
    path = "/api/v1.0/precipitation",
    responses(
        (status = OK, description = "Precipitation by date over the 365 days ending on the latest observation; empty when there is no data", body = BTreeMap<String, Option<f64>>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read the climate database", body = crate::ErrorBody)
    ))]
pub async fn precipitation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, Option<f64>>>, QueryError> {
    let by_date = state.queries.precipitation_last_12_months().await?;
    let body = by_date
        .into_iter()
        .map(|(date, precipitation)| Ok((format_date(date)?, precipitation)))
        .collect::<Result<BTreeMap<_, _>, QueryError>>()?;
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/stations",
    responses(
        (status = OK, description = "Every station id", body = Vec<String>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read the climate database", body = crate::ErrorBody)
    ))]
pub async fn stations(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, QueryError> {
    Ok(Json(state.queries.station_ids().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/tobs",
    responses(
        (status = OK, description = "Temperatures of the most active station over the 365 days ending on the latest observation", body = Vec<TemperatureObservation>),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read the climate database", body = crate::ErrorBody)
    ))]
pub async fn tobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TemperatureObservation>>, QueryError> {
    Ok(Json(state.queries.most_active_temperatures().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}",
    params(
        ("start" = String, Path, description = "First date included, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature statistics from the start date onwards", body = AggregateResult),
        (status = BAD_REQUEST, description = "Start date is not YYYY-MM-DD", body = crate::ErrorBody),
        (status = NOT_FOUND, description = "No temperature observations in range", body = crate::ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read the climate database", body = crate::ErrorBody)
    ))]
pub async fn temperature_stats_from(
    State(state): State<Arc<AppState>>,
    Path(start): Path<String>,
) -> Result<Json<AggregateResult>, QueryError> {
    Ok(Json(state.queries.temperature_stats(&start, None).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1.0/{start}/{end}",
    params(
        ("start" = String, Path, description = "First date included, YYYY-MM-DD"),
        ("end" = String, Path, description = "Last date included, YYYY-MM-DD"),
    ),
    responses(
        (status = OK, description = "Temperature statistics between the two dates", body = AggregateResult),
        (status = BAD_REQUEST, description = "Dates are not YYYY-MM-DD or start is after end", body = crate::ErrorBody),
        (status = NOT_FOUND, description = "No temperature observations in range", body = crate::ErrorBody),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to read the climate database", body = crate::ErrorBody)
    ))]
pub async fn temperature_stats_between(
    State(state): State<Arc<AppState>>,
    Path((start, end)): Path<(String, String)>,
) -> Result<Json<AggregateResult>, QueryError> {
    Ok(Json(
        state.queries.temperature_stats(&start, Some(&end)).await?,
    ))
}
