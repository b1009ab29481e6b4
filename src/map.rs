//! The slice of the map rendering library this crate drives.

use std::rc::Rc;

use geojson::Feature;
use serde_json::json;

use crate::error::Result;
use crate::types::LngLat;

pub type MarkerId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Ru,
}

impl Language {
    /// The browser locale if it is exactly a supported language, English
    /// otherwise.
    pub fn resolve(locale: Option<&str>) -> Self {
        match locale {
            Some("ru") => Self::Ru,
            _ => Self::En,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// The map finished its first load.
    Load,
    /// The style changed; custom sources and layers may be gone.
    StyleData,
}

impl MapEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::StyleData => "styledata",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub container_id: String,
    pub access_token: String,
    pub style: String,
    pub center: LngLat,
    pub zoom: f64,
    pub language: Language,
}

impl MapOptions {
    /// Constructor options in the rendering library's own shape.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "container": self.container_id,
            "accessToken": self.access_token,
            "style": self.style,
            "center": self.center,
            "zoom": self.zoom,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    pub id: String,
    pub source: String,
    pub color: String,
    pub width: f64,
}

impl LineLayer {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "type": "line",
            "source": self.source,
            "layout": { "line-join": "round", "line-cap": "round" },
            "paint": { "line-color": self.color, "line-width": self.width },
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub class_name: String,
    pub image_url: String,
    pub size_px: u32,
    pub position: LngLat,
}

impl MarkerSpec {
    /// Inline style for the marker element.
    pub fn style_properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("background-image", format!("url({})", self.image_url)),
            ("width", format!("{}px", self.size_px)),
            ("height", format!("{}px", self.size_px)),
            ("background-size", "100%".to_owned()),
        ]
    }
}

/// One live map instance bound to a container.
pub trait MapHandle {
    fn has_source(&self, id: &str) -> bool;

    fn add_geojson_source(&self, id: &str, data: &Feature) -> Result<()>;

    fn set_source_data(&self, id: &str, data: &Feature) -> Result<()>;

    fn add_line_layer(&self, layer: &LineLayer) -> Result<()>;

    fn add_marker(&self, marker: &MarkerSpec) -> Result<MarkerId>;

    fn remove_marker(&self, id: MarkerId);

    /// Recompute the rendered size from the container's current layout.
    fn resize(&self);

    fn on(&self, event: MapEvent, listener: Box<dyn FnMut()>);

    fn on_error(&self, listener: Box<dyn FnMut(String)>);
}

pub trait MapFactory {
    fn create(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>>;
}
