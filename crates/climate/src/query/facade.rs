use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use time::Date;
use utoipa::ToSchema;

use crate::{
    aggregate, dates::iso_date, most_active_from_counts, parse_date, resolve_trailing_window,
    AggregateResult, ClimateData, DateWindow, ObservationFilter, QueryError,
};

/// A single temperature reading of the most active station
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct TemperatureObservation {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub temperature: Option<f64>,
}

/// The named read-only queries served by the API. Holds no state besides the
/// store handle, so it can be shared across concurrent requests.
#[derive(Clone)]
pub struct ClimateQueries {
    store: Arc<dyn ClimateData>,
}

impl ClimateQueries {
    pub fn new(store: Arc<dyn ClimateData>) -> Self {
        Self { store }
    }

    /// Trailing window anchored on the latest observation, recomputed per call
    pub async fn trailing_window(&self) -> Result<DateWindow, QueryError> {
        let latest = self.store.scan(&ObservationFilter::latest()).await?;
        let window = resolve_trailing_window(&latest)?;
        debug!("trailing window: {} to {}", window.start, window.end);
        Ok(window)
    }

    /// Precipitation by date over the trailing window.
    ///
    /// Stations reporting on the same date collapse into one entry: rows are
    /// scanned in `(date, station_id)` order and the last one wins.
    pub async fn precipitation_last_12_months(
        &self,
    ) -> Result<BTreeMap<Date, Option<f64>>, QueryError> {
        let Some(window) = empty_as_none(self.trailing_window().await)? else {
            return Ok(BTreeMap::new());
        };

        let observations = self
            .store
            .scan(&ObservationFilter::since(window.start))
            .await?;
        debug!(
            "{} precipitation observations since {}",
            observations.len(),
            window.start
        );

        Ok(observations
            .into_iter()
            .map(|observation| (observation.date, observation.precipitation))
            .collect())
    }

    /// Every station id, never a count
    pub async fn station_ids(&self) -> Result<Vec<String>, QueryError> {
        let stations = self.store.stations().await?;
        Ok(stations
            .into_iter()
            .map(|station| station.station_id)
            .collect())
    }

    /// Raw temperatures of the most active station (ranked over the whole
    /// dataset) inside the dataset's trailing window
    pub async fn most_active_temperatures(
        &self,
    ) -> Result<Vec<TemperatureObservation>, QueryError> {
        let Some(window) = empty_as_none(self.trailing_window().await)? else {
            return Ok(vec![]);
        };
        let counts = self.store.count_by_station().await?;
        let Some(station_id) = empty_as_none(most_active_from_counts(&counts))? else {
            return Ok(vec![]);
        };
        debug!(
            "most active station: {} ({} observations)",
            station_id,
            counts.get(&station_id).copied().unwrap_or_default()
        );

        let filter = ObservationFilter::since(window.start).for_station(station_id);
        let observations = self.store.scan(&filter).await?;

        Ok(observations
            .into_iter()
            .map(|observation| TemperatureObservation {
                date: observation.date,
                temperature: observation.temperature,
            })
            .collect())
    }

    /// Min/avg/max temperature from `start`, up to `end` when given. Both
    /// bounds are inclusive and validated before the store is touched.
    pub async fn temperature_stats(
        &self,
        start: &str,
        end: Option<&str>,
    ) -> Result<AggregateResult, QueryError> {
        let start_date =
            parse_date(start).map_err(|_| QueryError::InvalidDateFormat(start.to_owned()))?;
        let end_date = end
            .map(|end| parse_date(end).map_err(|_| QueryError::InvalidDateFormat(end.to_owned())))
            .transpose()?;

        if let Some(end_date) = end_date {
            if start_date > end_date {
                return Err(QueryError::InvalidDateRange {
                    start: start_date,
                    end: end_date,
                });
            }
        }

        let filter = ObservationFilter::since(start_date).until(end_date);
        let observations = self.store.scan(&filter).await?;
        debug!(
            "aggregating {} observations from {} to {:?}",
            observations.len(),
            start_date,
            end_date
        );

        aggregate(&observations)
    }
}

/// Turns `EmptyDataset` into `None` for queries that answer "no data" with an empty payload
fn empty_as_none<T>(result: Result<T, QueryError>) -> Result<Option<T>, QueryError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(QueryError::EmptyDataset(reason)) => {
            debug!("empty result: {}", reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
