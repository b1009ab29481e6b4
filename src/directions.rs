use std::rc::Rc;

use geojson::{Geometry, Value};
use reqwest::Url;
use serde::Deserialize;

use crate::error::{Result, RouteMapError};
use crate::http::HttpTransport;
use crate::types::{LngLat, RouteGeometry};

// Only the first route's geometry is used, everything else in the answer is ignored.
#[derive(Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    geometry: Geometry,
}

/// Client for the driving directions API.
pub struct DirectionsClient {
    transport: Rc<dyn HttpTransport>,
    base_url: String,
    profile: String,
    access_token: String,
}

impl DirectionsClient {
    pub fn new(
        transport: Rc<dyn HttpTransport>,
        base_url: impl Into<String>,
        profile: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            profile: profile.into(),
            access_token: access_token.into(),
        }
    }

    /// `<base>/<profile>/<lon,lat;lon,lat;...>?geometries=geojson&access_token=<token>`
    pub fn request_url(&self, coordinates: &[LngLat]) -> Result<String> {
        let waypoints = coordinates
            .iter()
            .map(|[lng, lat]| format!("{},{}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");
        let raw = format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.profile,
            waypoints
        );
        let mut url = Url::parse(&raw).map_err(|e| RouteMapError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("geometries", "geojson")
            .append_pair("access_token", &self.access_token);
        Ok(url.into())
    }

    /// Geometry of the first route the service suggests.
    pub async fn fetch_geometry(&self, coordinates: &[LngLat]) -> Result<RouteGeometry> {
        let url = self.request_url(coordinates)?;
        let response = self
            .transport
            .get(&url)
            .await?
            .error_for_status(&self.redacted(&url))?;
        let parsed: DirectionsResponse = response.json()?;
        let first = parsed
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RouteMapError::DirectionsFetch("No routes found".to_owned()))?;
        line_coordinates(first.geometry)
    }

    // Keeps the token out of log records.
    fn redacted(&self, url: &str) -> String {
        url.replace(self.access_token.as_str(), "***")
    }
}

fn line_coordinates(geometry: Geometry) -> Result<RouteGeometry> {
    match geometry.value {
        Value::LineString(positions) => positions
            .into_iter()
            .map(|position| match position.as_slice() {
                [lng, lat, ..] => Ok([*lng, *lat]),
                _ => Err(RouteMapError::DirectionsFetch(format!(
                    "position with {} values",
                    position.len()
                ))),
            })
            .collect(),
        _ => Err(RouteMapError::DirectionsFetch(
            "expected LineString geometry".to_owned(),
        )),
    }
}
