//! Runtime config document and page-level settings.
//!
//! [`Config`] is the small JSON document fetched once at startup. [`Settings`]
//! holds everything else the page can override (endpoints, map look, hook
//! timing); every field has a default so an empty `{}` is a valid override.

use serde::Deserialize;

use crate::error::{Result, RouteMapError};
use crate::geometry::GeometryCachePolicy;
use crate::http::HttpTransport;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub access_token: String,
    pub routes_url: String,
    pub marker_image_url: String,
}

/// Fetches and parses the config document.
///
/// Issues exactly one GET against `url`. A non-2xx answer or an unparsable
/// body is a [`RouteMapError::ConfigLoad`], which the caller treats as fatal.
pub async fn load_config(transport: &dyn HttpTransport, url: &str) -> Result<Config> {
    let failed = |reason: String| RouteMapError::ConfigLoad {
        url: url.to_owned(),
        reason,
    };

    let response = transport.get(url).await.map_err(|e| failed(e.to_string()))?;
    if !response.is_success() {
        return Err(failed(format!(
            "Network response was not ok ({})",
            response.status
        )));
    }
    let config: Config = response.json().map_err(|e| failed(e.to_string()))?;
    log::info!("Config loaded from {}", url);
    Ok(config)
}

/// What happens to the endpoint marker when a route is drawn again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
    /// Remove the marker placed by the previous render before adding a new one.
    #[default]
    Replace,
    /// Add a new marker on every render, stacking them at the same spot.
    Accumulate,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub config_url: String,
    pub routes_cache_url: String,
    pub directions_base_url: String,
    pub directions_profile: String,
    pub map_style: String,
    pub zoom: f64,
    pub container_width: String,
    pub container_height: String,
    pub line_color: String,
    pub line_width: f64,
    pub marker_size_px: u32,
    pub marker_mode: MarkerMode,
    pub resync_delay_ms: u32,
    pub panel_selector: String,
    pub panel_shown_event: String,
    pub map_selector: String,
    /// Only initialize on pages whose path contains this fragment.
    pub page_path_filter: Option<String>,
    /// Geometry cache entries older than this are refetched. `None` keeps
    /// them forever.
    pub geometry_cache_max_age_secs: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_url: "/config_mapbox.json".to_owned(),
            routes_cache_url: "/wp-json/custom-routes/v1/routes".to_owned(),
            directions_base_url: "https://api.mapbox.com/directions/v5/mapbox".to_owned(),
            directions_profile: "driving".to_owned(),
            map_style: "mapbox://styles/mapbox/streets-v11".to_owned(),
            zoom: 8.0,
            container_width: "100%".to_owned(),
            container_height: "400px".to_owned(),
            line_color: "#FF0000".to_owned(),
            line_width: 6.0,
            marker_size_px: 30,
            marker_mode: MarkerMode::default(),
            resync_delay_ms: 50,
            panel_selector: ".collapse".to_owned(),
            panel_shown_event: "shown.bs.collapse".to_owned(),
            map_selector: ".map".to_owned(),
            page_path_filter: None,
            geometry_cache_max_age_secs: None,
        }
    }
}

impl Settings {
    /// Parses page overrides; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_active_for(&self, path: &str) -> bool {
        match &self.page_path_filter {
            Some(fragment) => path.contains(fragment.as_str()),
            None => true,
        }
    }

    pub fn geometry_cache_policy(&self) -> GeometryCachePolicy {
        GeometryCachePolicy {
            max_age: self
                .geometry_cache_max_age_secs
                .map(chrono::Duration::seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use futures::executor::block_on;
    use reqwest::StatusCode;
    use rstest::rstest;

    const CONFIG_JSON: &str = r#"{
        "accessToken": "pk.test-token",
        "routesUrl": "/wp-content/themes/site/js/routes.json",
        "markerImageUrl": "/wp-content/themes/site/img/marker.png"
    }"#;

    #[test]
    fn loads_every_declared_field_with_a_single_request() {
        let transport = FakeTransport::new();
        transport.on_get("/config_mapbox.json", StatusCode::OK, CONFIG_JSON);

        let config = block_on(load_config(&transport, "/config_mapbox.json")).expect("config");

        assert_eq!(config.access_token, "pk.test-token");
        assert_eq!(config.routes_url, "/wp-content/themes/site/js/routes.json");
        assert_eq!(config.marker_image_url, "/wp-content/themes/site/img/marker.png");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "/config_mapbox.json");
    }

    #[rstest]
    #[case(StatusCode::NOT_FOUND, CONFIG_JSON)]
    #[case(StatusCode::OK, "{not json")]
    #[case(StatusCode::OK, r#"{"accessToken":"pk.only"}"#)]
    fn bad_config_is_a_load_failure(#[case] status: StatusCode, #[case] body: &str) {
        let transport = FakeTransport::new();
        transport.on_get("/config_mapbox.json", status, body);

        let err = block_on(load_config(&transport, "/config_mapbox.json")).expect_err("failure");
        assert!(matches!(err, RouteMapError::ConfigLoad { .. }));
    }

    #[test]
    fn unreachable_config_is_a_load_failure() {
        let transport = FakeTransport::new();
        let err = block_on(load_config(&transport, "/config_mapbox.json")).expect_err("failure");
        assert!(matches!(err, RouteMapError::ConfigLoad { .. }));
    }

    #[test]
    fn empty_overrides_keep_defaults() {
        let settings = Settings::from_json("{}").expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.geometry_cache_policy().max_age, None);
    }

    #[test]
    fn overrides_replace_individual_fields() {
        let settings = Settings::from_json(
            r#"{"zoom": 11, "markerMode": "accumulate", "pagePathFilter": "/contacts/scheme",
                "geometryCacheMaxAgeSecs": 3600}"#,
        )
        .expect("settings");
        assert_eq!(settings.zoom, 11.0);
        assert_eq!(settings.marker_mode, MarkerMode::Accumulate);
        assert_eq!(settings.container_height, "400px");
        assert_eq!(
            settings.geometry_cache_policy().max_age,
            Some(chrono::Duration::hours(1))
        );
    }

    #[rstest]
    #[case(None, "/anything", true)]
    #[case(Some("/contacts/scheme"), "/contacts/scheme/", true)]
    #[case(Some("/contacts/scheme"), "/en/contacts/scheme/north", true)]
    #[case(Some("/contacts/scheme"), "/contacts/", false)]
    fn page_filter(#[case] filter: Option<&str>, #[case] path: &str, #[case] active: bool) {
        let settings = Settings {
            page_path_filter: filter.map(str::to_owned),
            ..Settings::default()
        };
        assert_eq!(settings.is_active_for(path), active);
    }
}
