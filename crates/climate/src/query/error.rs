use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::ToSchema;

use crate::db;

#[derive(thiserror::Error, Debug)]
pub enum QueryError {
    #[error("Climate store unavailable: {0}")]
    StoreUnavailable(#[from] db::Error),
    #[error("Invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDateFormat(String),
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: Date, end: Date },
    #[error("No data: {0}")]
    EmptyDataset(&'static str),
    #[error("Failed to format date: {0}")]
    DateFormat(#[from] time::error::Format),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::StoreUnavailable(_) => "StoreUnavailable",
            QueryError::InvalidDateFormat(_) => "InvalidDateFormat",
            QueryError::InvalidDateRange { .. } => "InvalidDateRange",
            QueryError::EmptyDataset(_) => "EmptyDataset",
            QueryError::DateFormat(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::StoreUnavailable(_) | QueryError::DateFormat(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            QueryError::InvalidDateFormat(_) | QueryError::InvalidDateRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            QueryError::EmptyDataset(_) => StatusCode::NOT_FOUND,
        }
    }
}

/// JSON body of every failed API response
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorBody {
    /// Error kind, e.g. `InvalidDateFormat` or `EmptyDataset`
    pub error: String,
    pub message: String,
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("error serving query: {}", self);
        }
        let body = ErrorBody {
            error: self.kind().to_owned(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
