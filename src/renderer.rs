use std::cell::Cell;
use std::rc::Rc;

use geojson::{Feature, Geometry, Value};

use crate::config::MarkerMode;
use crate::error::{Result, RouteMapError};
use crate::geometry::GeometryResolver;
use crate::map::{LineLayer, MapHandle, MarkerId, MarkerSpec};
use crate::types::{to_position, Route, RouteGeometry};

const MARKER_CLASS: &str = "custom-marker";

#[derive(Debug, Clone, PartialEq)]
pub struct RouteStyle {
    pub line_color: String,
    pub line_width: f64,
    pub marker_image_url: String,
    pub marker_size_px: u32,
    pub marker_mode: MarkerMode,
}

/// Draws a route's line and endpoint marker onto a map. Runs on every map
/// load and every style change.
pub struct RouteRenderer {
    resolver: Rc<GeometryResolver>,
    style: RouteStyle,
}

impl RouteRenderer {
    pub fn new(resolver: Rc<GeometryResolver>, style: RouteStyle) -> Self {
        Self { resolver, style }
    }

    /// `placed_marker` remembers the marker from the previous render of the
    /// same map so [`MarkerMode::Replace`] can take it down first.
    pub async fn render(
        &self,
        map: &dyn MapHandle,
        route: &Route,
        placed_marker: &Cell<Option<MarkerId>>,
    ) -> Result<()> {
        let geometry = self.resolver.resolve(&route.coordinates).await;
        let source_id = route.source_id();
        let data = line_feature(&geometry);

        if map.has_source(&source_id) {
            map.set_source_data(&source_id, &data)?;
        } else {
            map.add_geojson_source(&source_id, &data)?;
            map.add_line_layer(&LineLayer {
                id: source_id.clone(),
                source: source_id,
                color: self.style.line_color.clone(),
                width: self.style.line_width,
            })?;
        }

        self.place_marker(map, route, placed_marker)?;
        map.resize();
        Ok(())
    }

    fn place_marker(
        &self,
        map: &dyn MapHandle,
        route: &Route,
        placed_marker: &Cell<Option<MarkerId>>,
    ) -> Result<()> {
        let position = route
            .end()
            .ok_or_else(|| RouteMapError::render(&route.id, "route has no coordinates"))?;

        if self.style.marker_mode == MarkerMode::Replace {
            if let Some(previous) = placed_marker.take() {
                map.remove_marker(previous);
            }
        }

        let id = map.add_marker(&MarkerSpec {
            class_name: MARKER_CLASS.to_owned(),
            image_url: self.style.marker_image_url.clone(),
            size_px: self.style.marker_size_px,
            position,
        })?;
        placed_marker.set(Some(id));
        Ok(())
    }
}

/// GeoJSON feature wrapping the geometry as a LineString with empty
/// properties.
pub fn line_feature(geometry: &RouteGeometry) -> Feature {
    Feature {
        geometry: Some(Geometry::new(Value::LineString(
            geometry.iter().map(to_position).collect(),
        ))),
        properties: Some(serde_json::Map::new()),
        ..Default::default()
    }
}
