use climate::{
    format_date, ClimateAccess, ClimateData, ClimateQueries, DateOrder, Error, ObservationFilter,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::{str::FromStr, sync::Arc};
use tempfile::TempDir;
use time::macros::date;

const SCHEMA: &str = "
    CREATE TABLE station (
        id INTEGER PRIMARY KEY,
        station TEXT NOT NULL,
        name TEXT,
        latitude REAL,
        longitude REAL,
        elevation REAL
    );
    CREATE TABLE measurement (
        id INTEGER PRIMARY KEY,
        station TEXT NOT NULL,
        date TEXT NOT NULL,
        prcp REAL,
        tobs REAL
    );
";

const MEASUREMENTS: &[(&str, &str, Option<f64>, f64)] = &[
    ("USC00519397", "2010-01-01", Some(0.08), 65.0),
    ("USC00519397", "2016-08-22", Some(1.2), 80.0),
    ("USC00519397", "2016-08-23", Some(0.0), 81.0),
    ("USC00519397", "2017-08-23", Some(0.0), 81.0),
    ("USC00513117", "2016-08-23", Some(0.15), 76.0),
    ("USC00513117", "2017-01-01", None, 62.0),
    ("USC00519281", "2016-09-01", Some(0.5), 77.0),
    ("USC00519281", "2017-01-01", Some(0.0), 66.0),
    ("USC00519281", "2017-01-15", None, 70.0),
    ("USC00519281", "2017-01-31", Some(0.1), 74.0),
    ("USC00519281", "2017-08-18", Some(0.06), 79.0),
];

/// Writes a small copy of the hawaii dataset into a temp dir and returns its path
async fn seed_database(dir: &TempDir) -> String {
    let path = dir.path().join("hawaii.sqlite");
    let path = path.to_str().unwrap().to_owned();

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
        .unwrap()
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();

    for (station, name) in [
        ("USC00519397", "WAIKIKI 717.2, HI US"),
        ("USC00513117", "KANEOHE 838.1, HI US"),
        ("USC00519281", "WAIHEE 837.5, HI US"),
    ] {
        sqlx::query(
            "INSERT INTO station (station, name, latitude, longitude, elevation)
             VALUES (?, ?, 21.3, -157.8, 3.0)",
        )
        .bind(station)
        .bind(name)
        .execute(&pool)
        .await
        .unwrap();
    }

    for (station, date, prcp, tobs) in MEASUREMENTS {
        sqlx::query("INSERT INTO measurement (station, date, prcp, tobs) VALUES (?, ?, ?, ?)")
            .bind(*station)
            .bind(*date)
            .bind(*prcp)
            .bind(*tobs)
            .execute(&pool)
            .await
            .unwrap();
    }

    pool.close().await;
    path
}

async fn open_store() -> (TempDir, ClimateAccess) {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_database(&dir).await;
    let store = ClimateAccess::new(&path, 2).await.unwrap();
    (dir, store)
}

#[tokio::test]
async fn scan_latest_returns_single_newest_row() {
    let (_dir, store) = open_store().await;

    let latest = store.scan(&ObservationFilter::latest()).await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].date, date!(2017 - 08 - 23));
    assert_eq!(latest[0].station_id, "USC00519397");
}

#[tokio::test]
async fn scan_applies_inclusive_bounds_in_date_order() {
    let (_dir, store) = open_store().await;

    let filter =
        ObservationFilter::since(date!(2017 - 01 - 01)).until(Some(date!(2017 - 01 - 31)));
    let rows = store.scan(&filter).await.unwrap();

    let keys: Vec<(String, String)> = rows
        .iter()
        .map(|o| (format_date(o.date).unwrap(), o.station_id.clone()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("2017-01-01".to_owned(), "USC00513117".to_owned()),
            ("2017-01-01".to_owned(), "USC00519281".to_owned()),
            ("2017-01-15".to_owned(), "USC00519281".to_owned()),
            ("2017-01-31".to_owned(), "USC00519281".to_owned()),
        ]
    );
    assert_eq!(rows[0].precipitation, None);
    assert_eq!(rows[1].precipitation, Some(0.0));
}

#[tokio::test]
async fn scan_by_station_descending() {
    let (_dir, store) = open_store().await;

    let filter = ObservationFilter {
        order: DateOrder::Descending,
        ..ObservationFilter::since(date!(2016 - 08 - 23)).for_station("USC00519397")
    };
    let rows = store.scan(&filter).await.unwrap();

    let dates: Vec<_> = rows.iter().map(|o| o.date).collect();
    assert_eq!(dates, vec![date!(2017 - 08 - 23), date!(2016 - 08 - 23)]);
}

#[tokio::test]
async fn scan_without_matches_is_empty() {
    let (_dir, store) = open_store().await;

    let rows = store
        .scan(&ObservationFilter::since(date!(2099 - 01 - 01)))
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn stations_lists_every_station_with_metadata() {
    let (_dir, store) = open_store().await;

    let stations = store.stations().await.unwrap();
    let ids: Vec<&str> = stations.iter().map(|s| s.station_id.as_str()).collect();
    assert_eq!(ids, vec!["USC00513117", "USC00519281", "USC00519397"]);
    assert_eq!(stations[1].name.as_deref(), Some("WAIHEE 837.5, HI US"));
    assert_eq!(stations[1].elevation, Some(3.0));
}

#[tokio::test]
async fn counts_observations_per_station() {
    let (_dir, store) = open_store().await;

    let counts = store.count_by_station().await.unwrap();
    assert_eq!(counts.get("USC00519281"), Some(&5));
    assert_eq!(counts.get("USC00519397"), Some(&4));
    assert_eq!(counts.get("USC00513117"), Some(&2));
}

#[tokio::test]
async fn queries_run_end_to_end_against_sqlite() {
    let (_dir, store) = open_store().await;
    let queries = ClimateQueries::new(Arc::new(store));

    let window = queries.trailing_window().await.unwrap();
    assert_eq!(window.start, date!(2016 - 08 - 23));
    assert_eq!(window.end, date!(2017 - 08 - 23));

    let precipitation = queries.precipitation_last_12_months().await.unwrap();
    assert!(!precipitation.contains_key(&date!(2016 - 08 - 22)));
    // USC00519397 sorts after USC00513117 on the same date, so its reading survives
    assert_eq!(precipitation[&date!(2016 - 08 - 23)], Some(0.0));
    assert_eq!(precipitation[&date!(2017 - 01 - 15)], None);

    let temperatures = queries.most_active_temperatures().await.unwrap();
    assert_eq!(temperatures.len(), 5);
    assert_eq!(temperatures[0].date, date!(2016 - 09 - 01));

    let stats = queries
        .temperature_stats("2017-01-01", Some("2017-01-31"))
        .await
        .unwrap();
    assert_eq!(stats.min, 62.0);
    assert_eq!(stats.avg, 68.0);
    assert_eq!(stats.max, 74.0);
}

#[tokio::test]
async fn malformed_stored_date_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed_database(&dir).await;

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))
        .unwrap()
        .journal_mode(SqliteJournalMode::Delete);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO measurement (station, date, prcp, tobs) VALUES ('X', '2018-1-5', 0.0, 70.0)",
    )
    .execute(&pool)
    .await
    .unwrap();
    pool.close().await;

    let store = ClimateAccess::new(&path, 1).await.unwrap();
    let err = store.scan(&ObservationFilter::latest()).await.unwrap_err();
    assert!(matches!(err, Error::MalformedDate { ref value, .. } if value == "2018-1-5"));
}

#[tokio::test]
async fn missing_database_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.sqlite");

    let result = ClimateAccess::new(path.to_str().unwrap(), 1).await;
    assert!(result.is_err());
}
