use crate::dates::{format_date, iso_date, parse_date};
use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use scooby::postgres::{select, Aliasable, Orderable, Parameters, Select};
use serde::{Deserialize, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{collections::BTreeMap, str::FromStr, time::Duration};
use time::Date;
use utoipa::ToSchema;

/// Read-only access to the `measurement` and `station` tables of the climate database
pub struct ClimateAccess {
    pool: SqlitePool,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query sqlite: {0}")]
    Query(#[from] sqlx::Error),
    #[error("Failed to build query: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Failed to format date: {0}")]
    TimeFormat(#[from] time::error::Format),
    #[error("Stored date {value:?} is not a YYYY-MM-DD date: {source}")]
    MalformedDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
}

/// Read path over the observation dataset. Every method is a pure read and an
/// empty result is never an error.
#[async_trait]
pub trait ClimateData: Sync + Send {
    /// Observations matching `filter`, ordered by `(date, station_id)` in the
    /// filter's direction.
    async fn scan(&self, filter: &ObservationFilter) -> Result<Vec<Observation>, Error>;
    /// Every station, ordered by station id.
    async fn stations(&self) -> Result<Vec<Station>, Error>;
    /// Observation count per station across the whole dataset.
    async fn count_by_station(&self) -> Result<BTreeMap<String, u64>, Error>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateOrder {
    #[default]
    Ascending,
    Descending,
}

/// Predicates for [`ClimateData::scan`]. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationFilter {
    pub station_id: Option<String>,
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub order: DateOrder,
    pub limit: Option<u32>,
}

impl ObservationFilter {
    /// The single most recent observation in the dataset.
    pub fn latest() -> Self {
        Self {
            order: DateOrder::Descending,
            limit: Some(1),
            ..Default::default()
        }
    }

    pub fn since(start: Date) -> Self {
        Self {
            start: Some(start),
            ..Default::default()
        }
    }

    pub fn until(mut self, end: Option<Date>) -> Self {
        self.end = end;
        self
    }

    pub fn for_station(mut self, station_id: impl Into<String>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    pub fn matches(&self, observation: &Observation) -> bool {
        self.station_id
            .as_ref()
            .map_or(true, |id| *id == observation.station_id)
            && self.start.map_or(true, |start| observation.date >= start)
            && self.end.map_or(true, |end| observation.date <= end)
    }
}

impl ClimateAccess {
    /// Opens a read-only pool over the sqlite file at `path`
    pub async fn new(path: &str, max_connections: u32) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .read_only(true)
            .pragma("busy_timeout", "5000");

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let access = Self::from_pool(pool);
        access.ping().await?;
        info!(
            "climate database opened read-only at: {} ({} connections)",
            path, max_connections
        );
        Ok(access)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ping(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Runs a query built with scooby's `$n` placeholders against sqlite's `?` binding.
    /// Every statement acquires its own pooled connection and releases it on completion.
    pub async fn query(
        &self,
        select: Select,
        params: Vec<String>,
    ) -> Result<Vec<SqliteRow>, Error> {
        let re = Regex::new(r"\$(\d+)")?;
        let binding = select.to_string();
        let fixed_params = re.replace_all(&binding, "?");
        debug!("running query: {}", fixed_params);

        let mut query = sqlx::query(fixed_params.as_ref());
        for value in params {
            query = query.bind(value);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl ClimateData for ClimateAccess {
    async fn scan(&self, filter: &ObservationFilter) -> Result<Vec<Observation>, Error> {
        let mut placeholders = Parameters::new();
        let mut values: Vec<String> = vec![];

        let mut query = select(("station", "date", "prcp", "tobs")).from("measurement");

        if let Some(station_id) = &filter.station_id {
            query = query.where_(format!("station = {}", placeholders.next()));
            values.push(station_id.clone());
        }
        // Bounds are bound as fixed-width text so sqlite's string comparison is chronological
        if let Some(start) = filter.start {
            query = query.where_(format!("date >= {}", placeholders.next()));
            values.push(format_date(start)?);
        }
        if let Some(end) = filter.end {
            query = query.where_(format!("date <= {}", placeholders.next()));
            values.push(format_date(end)?);
        }

        query = match filter.order {
            DateOrder::Ascending => query.order_by(("date".asc(), "station".asc())),
            DateOrder::Descending => query.order_by(("date".desc(), "station".desc())),
        };
        if let Some(limit) = filter.limit {
            query = query.limit(u64::from(limit));
        }

        let rows = self.query(query, values).await?;
        let observations = rows
            .iter()
            .map(Observation::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        debug!("scan {:?} matched {} observations", filter, observations.len());
        Ok(observations)
    }

    async fn stations(&self) -> Result<Vec<Station>, Error> {
        let query = select(("station", "name", "latitude", "longitude", "elevation"))
            .from("station")
            .order_by("station".asc());

        let rows = self.query(query, vec![]).await?;
        rows.iter().map(Station::try_from).collect()
    }

    async fn count_by_station(&self) -> Result<BTreeMap<String, u64>, Error> {
        let query = select(("station", "COUNT(*)".as_("observations")))
            .from("measurement")
            .group_by("station");

        let rows = self.query(query, vec![]).await?;
        let mut counts = BTreeMap::new();
        for row in rows {
            let station: String = row.try_get("station")?;
            let observations: i64 = row.try_get("observations")?;
            counts.insert(station, observations.max(0) as u64);
        }
        Ok(counts)
    }
}

/// One daily reading from a station
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Observation {
    pub station_id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Precipitation in inches; absent when the station did not measure it that day
    pub precipitation: Option<f64>,
    /// Observed temperature in degrees Fahrenheit
    pub temperature: Option<f64>,
}

impl TryFrom<&SqliteRow> for Observation {
    type Error = Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        let raw_date: String = row.try_get("date")?;
        let date = parse_date(&raw_date).map_err(|source| Error::MalformedDate {
            value: raw_date.clone(),
            source,
        })?;

        Ok(Observation {
            station_id: row.try_get("station")?,
            date,
            precipitation: row.try_get("prcp")?,
            temperature: row.try_get("tobs")?,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Station {
    pub station_id: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

impl TryFrom<&SqliteRow> for Station {
    type Error = Error;

    fn try_from(row: &SqliteRow) -> Result<Self, Self::Error> {
        Ok(Station {
            station_id: row.try_get("station")?,
            name: row.try_get("name")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            elevation: row.try_get("elevation")?,
        })
    }
}
