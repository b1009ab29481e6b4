use serde::{Deserialize, Serialize};

// ** Coordinates **

/// A `[longitude, latitude]` pair, in the order GeoJSON and the directions
/// service use.
pub type LngLat = [f64; 2];

/// Detailed path returned by the directions service for a route.
pub type RouteGeometry = Vec<LngLat>;

// ** Routes **

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Also the id of the DOM container the route is drawn into.
    pub id: String,
    pub coordinates: Vec<LngLat>,
}

impl Route {
    /// Initial map centre.
    pub fn start(&self) -> Option<LngLat> {
        self.coordinates.first().copied()
    }

    /// Marker position.
    pub fn end(&self) -> Option<LngLat> {
        self.coordinates.last().copied()
    }

    /// Identifier shared by the route's GeoJSON source and its line layer.
    pub fn source_id(&self) -> String {
        format!("route{}", self.id)
    }
}

pub(crate) fn to_position(coordinate: &LngLat) -> Vec<f64> {
    coordinate.to_vec()
}
