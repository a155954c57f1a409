/// Plain-text list of the available API routes
pub const ROUTE_LIST: &str = "Welcome to the Climate Analysis API.
Available Routes:
/api/v1.0/precipitation
/api/v1.0/stations
/api/v1.0/tobs
/api/v1.0/<start>
/api/v1.0/<start>/<end>
Dates use the YYYY-MM-DD format.
";

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = OK, description = "Available API routes", content_type = "text/plain", body = String),
    ))]
pub async fn index_handler() -> &'static str {
    ROUTE_LIST
}
