//! Cache-or-fetch resolution of route geometry.
//!
//! Geometry is looked up in the per-browser store under a key built from the
//! literal coordinates (`route_30,50_31,51`). On a miss the directions service
//! is asked and the first route's geometry is written back under that key.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use crate::directions::DirectionsClient;
use crate::error::Result;
use crate::storage::{Clock, KeyValueStore};
use crate::types::{LngLat, RouteGeometry};

const STORED_AT_SUFFIX: &str = "@stored_at";

/// How long cached geometry stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryCachePolicy {
    /// `None` keeps entries forever and writes no timestamp.
    pub max_age: Option<Duration>,
}

/// Storage key for a coordinate list, e.g. `route_30,50_31,51`.
///
/// Numbers are written the way JavaScript stringifies them, so keys match
/// entries stored by the script version of the page.
pub fn cache_key(coordinates: &[LngLat]) -> String {
    let joined = coordinates
        .iter()
        .map(|[lng, lat]| format!("{},{}", js_number(*lng), js_number(*lat)))
        .collect::<Vec<_>>()
        .join("_");
    format!("route_{}", joined)
}

/// `Number.prototype.toString`: `-0` prints as `0`, and magnitudes below
/// 1e-6 or from 1e21 up use exponent notation (`5e-7`, `1e+21`).
fn js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let formatted = format!("{:e}", value);
        if let Some((mantissa, exponent)) = formatted.split_once('e') {
            if !exponent.starts_with('-') {
                return format!("{}e+{}", mantissa, exponent);
            }
        }
        return formatted;
    }
    value.to_string()
}

pub struct GeometryResolver {
    directions: DirectionsClient,
    store: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    policy: GeometryCachePolicy,
}

impl GeometryResolver {
    pub fn new(
        directions: DirectionsClient,
        store: Rc<dyn KeyValueStore>,
        clock: Rc<dyn Clock>,
        policy: GeometryCachePolicy,
    ) -> Self {
        Self {
            directions,
            store,
            clock,
            policy,
        }
    }

    /// Never fails: a failed lookup is logged and yields an empty geometry,
    /// which the renderer draws as an empty line.
    pub async fn resolve(&self, coordinates: &[LngLat]) -> RouteGeometry {
        let key = cache_key(coordinates);

        if let Some(cached) = self.cached(&key) {
            log::info!("Route data loaded from local storage.");
            return cached;
        }

        match self.directions.fetch_geometry(coordinates).await {
            Ok(geometry) => {
                if let Err(e) = self.persist(&key, &geometry) {
                    log::warn!("Could not store route data under {}: {}", key, e);
                }
                geometry
            }
            Err(e) => {
                log::error!("Error fetching route data: {}", e);
                Vec::new()
            }
        }
    }

    fn cached(&self, key: &str) -> Option<RouteGeometry> {
        let raw = match self.store.get_item(key) {
            Ok(raw) => raw?,
            Err(e) => {
                log::warn!("Could not read route data {}: {}", key, e);
                return None;
            }
        };
        if !self.is_fresh(key) {
            log::debug!("Stored route data {} expired", key);
            return None;
        }
        match serde_json::from_str(&raw) {
            Ok(geometry) => Some(geometry),
            Err(e) => {
                log::warn!("Ignoring unreadable route data {}: {}", key, e);
                None
            }
        }
    }

    fn is_fresh(&self, key: &str) -> bool {
        let Some(max_age) = self.policy.max_age else {
            return true;
        };
        let stored_at = self
            .store
            .get_item(&stamp_key(key))
            .ok()
            .flatten()
            .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
            .map(|at| at.with_timezone(&Utc));
        match stored_at {
            Some(at) => self.clock.now() - at < max_age,
            None => false,
        }
    }

    fn persist(&self, key: &str, geometry: &RouteGeometry) -> Result<()> {
        self.store.set_item(key, &serde_json::to_string(geometry)?)?;
        if self.policy.max_age.is_some() {
            self.store
                .set_item(&stamp_key(key), &self.clock.now().to_rfc3339())?;
        }
        Ok(())
    }
}

fn stamp_key(key: &str) -> String {
    format!("{}{}", key, STORED_AT_SUFFIX)
}
