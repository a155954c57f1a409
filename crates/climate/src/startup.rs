use crate::{
    index_handler, precipitation, query, routes, stations, temperature_stats_between,
    temperature_stats_from, tobs, ClimateAccess, ClimateData, ClimateQueries,
};
use anyhow::{anyhow, bail};
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use climate_core::is_file;
use hyper::{header::ACCEPT, Method};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[derive(Clone)]
pub struct AppState {
    pub queries: ClimateQueries,
}

impl AppState {
    pub fn new(climate_db: Arc<dyn ClimateData>) -> Self {
        Self {
            queries: ClimateQueries::new(climate_db),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::home::index::index_handler,
        routes::climate::climate_routes::precipitation,
        routes::climate::climate_routes::stations,
        routes::climate::climate_routes::tobs,
        routes::climate::climate_routes::temperature_stats_from,
        routes::climate::climate_routes::temperature_stats_between,
    ),
    components(
        schemas(
                query::AggregateResult,
                query::TemperatureObservation,
                query::ErrorBody,
        )
    ),
    tags(
        (name = "climate analysis api", description = "a read-only RESTful api over daily station precipitation and temperature observations")
    )
)]
struct ApiDoc;

pub async fn build_app_state(database: String, max_connections: u32) -> anyhow::Result<AppState> {
    if !is_file(&database) {
        bail!("climate database not found at: {}", database);
    }

    let climate_db = Arc::new(
        ClimateAccess::new(&database, max_connections)
            .await
            .map_err(|e| anyhow!("error opening climate database: {}", e))?,
    );

    Ok(AppState::new(climate_db))
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT])
        .allow_origin(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/api/v1.0/precipitation", get(precipitation))
        .route("/api/v1.0/stations", get(stations))
        .route("/api/v1.0/tobs", get(tobs))
        .route("/api/v1.0/{start}", get(temperature_stats_from))
        .route("/api/v1.0/{start}/{end}", get(temperature_stats_between))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_default()
        .to_owned();
    info!(target: "http_request", "new request, {} {}", request.method().as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(target: "http_response", "response, {} code: {}, time: {}", path, response.status().as_str(), response_time);

    response
}
