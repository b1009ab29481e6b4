use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use geojson::Feature;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::error::{Result, RouteMapError};
use crate::map::{LineLayer, MapEvent, MapFactory, MapHandle, MapOptions, MarkerId, MarkerSpec};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Map)]
    type JsMap;

    #[wasm_bindgen(constructor, catch, js_namespace = mapboxgl, js_class = "Map")]
    fn new(options: &JsValue) -> std::result::Result<JsMap, JsValue>;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &JsMap, id: &str, source: &JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &JsMap, layer: &JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = addControl)]
    fn add_control(this: &JsMap, control: &JsValue);

    #[wasm_bindgen(method)]
    fn resize(this: &JsMap);

    #[wasm_bindgen(method)]
    fn on(this: &JsMap, event: &str, listener: &Closure<dyn FnMut(JsValue)>);

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = GeoJSONSource)]
    type JsGeoJsonSource;

    #[wasm_bindgen(method, catch, js_name = setData)]
    fn set_data(this: &JsGeoJsonSource, data: &JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(js_namespace = mapboxgl, js_name = Marker)]
    type JsMarker;

    #[wasm_bindgen(constructor, js_namespace = mapboxgl, js_class = "Marker")]
    fn new(element: &web_sys::HtmlElement) -> JsMarker;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &JsMarker, lng_lat: &JsValue) -> JsMarker;

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &JsMarker, map: &JsMap) -> JsMarker;

    #[wasm_bindgen(method)]
    fn remove(this: &JsMarker);

    type MapboxLanguage;

    #[wasm_bindgen(constructor)]
    fn new(options: &JsValue) -> MapboxLanguage;
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| RouteMapError::Map(e.to_string()))
}

pub(crate) fn js_message(value: &JsValue) -> String {
    match value.dyn_ref::<js_sys::Error>() {
        Some(error) => String::from(error.message()),
        None => value.as_string().unwrap_or_else(|| format!("{:?}", value)),
    }
}

pub(crate) fn js_error(value: JsValue) -> RouteMapError {
    RouteMapError::Map(js_message(&value))
}

/// A `mapboxgl.Map` together with the markers and listeners it owns.
pub struct WebMap {
    map: JsMap,
    document: web_sys::Document,
    markers: RefCell<HashMap<MarkerId, JsMarker>>,
    next_marker: Cell<MarkerId>,
    listeners: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl WebMap {
    fn listen(&self, event: &str, listener: Closure<dyn FnMut(JsValue)>) {
        self.map.on(event, &listener);
        self.listeners.borrow_mut().push(listener);
    }

    fn marker_element(&self, marker: &MarkerSpec) -> Result<web_sys::HtmlElement> {
        let element: web_sys::HtmlElement = self
            .document
            .create_element("div")
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| RouteMapError::Map("marker element is not an HTML element".to_owned()))?;
        element.set_class_name(&marker.class_name);
        let style = element.style();
        for (property, value) in marker.style_properties() {
            style.set_property(property, &value).map_err(js_error)?;
        }
        Ok(element)
    }
}

impl MapHandle for WebMap {
    fn has_source(&self, id: &str) -> bool {
        let source = self.map.get_source(id);
        !(source.is_undefined() || source.is_null())
    }

    fn add_geojson_source(&self, id: &str, data: &Feature) -> Result<()> {
        let source = serde_json::json!({ "type": "geojson", "data": data });
        self.map.add_source(id, &to_js(&source)?).map_err(js_error)
    }

    fn set_source_data(&self, id: &str, data: &Feature) -> Result<()> {
        let source: JsGeoJsonSource = self.map.get_source(id).unchecked_into();
        source.set_data(&to_js(data)?).map_err(js_error)
    }

    fn add_line_layer(&self, layer: &LineLayer) -> Result<()> {
        self.map.add_layer(&to_js(&layer.to_json())?).map_err(js_error)
    }

    fn add_marker(&self, marker: &MarkerSpec) -> Result<MarkerId> {
        let element = self.marker_element(marker)?;
        let js_marker = JsMarker::new(&element);
        js_marker.set_lng_lat(&to_js(&marker.position)?);
        js_marker.add_to(&self.map);

        let id = self.next_marker.get();
        self.next_marker.set(id + 1);
        self.markers.borrow_mut().insert(id, js_marker);
        Ok(id)
    }

    fn remove_marker(&self, id: MarkerId) {
        if let Some(marker) = self.markers.borrow_mut().remove(&id) {
            marker.remove();
        }
    }

    fn resize(&self) {
        self.map.resize();
    }

    fn on(&self, event: MapEvent, mut listener: Box<dyn FnMut()>) {
        let closure = Closure::wrap(Box::new(move |_event: JsValue| listener()) as Box<dyn FnMut(JsValue)>);
        self.listen(event.name(), closure);
    }

    fn on_error(&self, mut listener: Box<dyn FnMut(String)>) {
        let closure = Closure::wrap(Box::new(move |event: JsValue| {
            // Error events carry the actual error under `error`.
            let error = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                .ok()
                .filter(|error| !error.is_undefined())
                .unwrap_or(event);
            listener(js_message(&error));
        }) as Box<dyn FnMut(JsValue)>);
        self.listen("error", closure);
    }
}

/// Creates `mapboxgl.Map` instances with the language control attached.
pub struct MapboxFactory {
    document: web_sys::Document,
}

impl MapboxFactory {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }
}

impl MapFactory for MapboxFactory {
    fn create(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>> {
        let map = JsMap::new(&to_js(&options.to_json())?).map_err(js_error)?;
        let language = MapboxLanguage::new(&to_js(&serde_json::json!({
            "defaultLanguage": options.language.as_str(),
        }))?);
        map.add_control(&language);

        Ok(Rc::new(WebMap {
            map,
            document: self.document.clone(),
            markers: RefCell::new(HashMap::new()),
            next_marker: Cell::new(1),
            listeners: RefCell::new(Vec::new()),
        }))
    }
}
