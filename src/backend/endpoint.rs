use std::rc::Rc;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::transient::TransientStore;
use crate::http::HttpResponse;

pub const ROUTES_TRANSIENT_KEY: &str = "mapbox_routes";

/// How long posted routes stay cached: one month of thirty days.
pub fn routes_ttl() -> Duration {
    Duration::days(30)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl EndpointResponse {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    fn error(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({
                "code": code,
                "message": message,
                "data": { "status": status.as_u16() },
            }),
        }
    }
}

impl From<EndpointResponse> for HttpResponse {
    fn from(response: EndpointResponse) -> Self {
        HttpResponse::new(response.status, response.body.to_string())
    }
}

/// GET and POST handlers of the routes cache endpoint.
pub struct RoutesCacheEndpoint {
    store: Rc<dyn TransientStore>,
}

impl RoutesCacheEndpoint {
    pub fn new(store: Rc<dyn TransientStore>) -> Self {
        Self { store }
    }

    pub fn get(&self) -> EndpointResponse {
        match self.store.get(ROUTES_TRANSIENT_KEY) {
            Some(routes) if !is_empty_payload(&routes) => EndpointResponse::ok(routes),
            _ => EndpointResponse::error(
                StatusCode::NOT_FOUND,
                "no_routes_found",
                "Routes not found in cache.",
            ),
        }
    }

    pub fn post(&self, body: &str) -> EndpointResponse {
        let routes = match serde_json::from_str::<Value>(body) {
            Ok(routes) if !is_empty_payload(&routes) => routes,
            _ => {
                return EndpointResponse::error(
                    StatusCode::BAD_REQUEST,
                    "no_routes",
                    "No routes provided.",
                )
            }
        };
        self.store.set(ROUTES_TRANSIENT_KEY, routes, routes_ttl());
        log::info!("Stored routes under {}", ROUTES_TRANSIENT_KEY);
        EndpointResponse::ok(json!({ "message": "Routes cached successfully." }))
    }
}

// null, false, 0, "", [] and {} carry no routes.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty() || s == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}
