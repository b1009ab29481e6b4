//! Error types for the route map client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced while loading, resolving or drawing routes.
///
/// None of these are retried. Apart from [`RouteMapError::ConfigLoad`],
/// which aborts page initialization, every variant ends up as a log record
/// at the component boundary that caught it.
#[derive(Error, Debug)]
pub enum RouteMapError {
    #[error("failed to load config from {url}: {reason}")]
    ConfigLoad { url: String, reason: String },

    #[error("failed to fetch routes: {0}")]
    RouteListFetch(String),

    #[error("failed to cache routes: {0}")]
    CacheWrite(String),

    #[error("failed to render route {route_id}: {reason}")]
    RouteRender { route_id: String, reason: String },

    #[error("directions request failed: {0}")]
    DirectionsFetch(String),

    #[error("container {0} not found")]
    MissingContainer(String),

    #[error("container {0} already has a map")]
    DuplicateContainer(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: StatusCode, url: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("map error: {0}")]
    Map(String),
}

impl RouteMapError {
    pub(crate) fn render(route_id: &str, reason: impl ToString) -> Self {
        Self::RouteRender {
            route_id: route_id.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Result alias for route map operations.
pub type Result<T> = std::result::Result<T, RouteMapError>;
