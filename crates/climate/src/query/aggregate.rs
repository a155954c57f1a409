use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{cmp::Reverse, collections::BTreeMap};
use utoipa::ToSchema;

use crate::{Observation, QueryError};

/// Temperature statistics over a set of observations
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, ToSchema)]
pub struct AggregateResult {
    pub min: f64,
    /// Arithmetic mean of the non-null temperatures
    pub avg: f64,
    pub max: f64,
}

/// Number of observations per station id
pub fn station_counts(observations: &[Observation]) -> BTreeMap<String, u64> {
    observations
        .iter()
        .map(|observation| observation.station_id.clone())
        .counts()
        .into_iter()
        .map(|(station_id, count)| (station_id, count as u64))
        .collect()
}

/// Station with the highest count. Ties go to the smallest station id.
pub fn most_active_from_counts(counts: &BTreeMap<String, u64>) -> Result<String, QueryError> {
    counts
        .iter()
        .min_by_key(|&(station_id, count)| (Reverse(*count), station_id))
        .map(|(station_id, _)| station_id.clone())
        .ok_or(QueryError::EmptyDataset("no observations to rank stations by"))
}

pub fn most_active_station(observations: &[Observation]) -> Result<String, QueryError> {
    most_active_from_counts(&station_counts(observations))
}

/// Min, mean and max of `temperature`; precipitation is ignored.
pub fn aggregate(observations: &[Observation]) -> Result<AggregateResult, QueryError> {
    let mut count = 0_usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for temperature in observations
        .iter()
        .filter_map(|observation| observation.temperature)
        .filter(|temperature| temperature.is_finite())
    {
        count += 1;
        sum += temperature;
        min = min.min(temperature);
        max = max.max(temperature);
    }

    if count == 0 {
        return Err(QueryError::EmptyDataset(
            "no temperature observations in range",
        ));
    }

    // rounding in the sum can push the mean a hair outside [min, max]
    let avg = (sum / count as f64).clamp(min, max);

    Ok(AggregateResult { min, avg, max })
}
