//! In-memory stand-ins for the network, the page and the map library.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::channel::oneshot;
use futures::future::{FutureExt, LocalBoxFuture};
use geojson::{Feature, Value};
use reqwest::StatusCode;

use crate::backend::RoutesCacheEndpoint;
use crate::error::{Result, RouteMapError};
use crate::http::{HttpResponse, HttpTransport};
use crate::map::{
    Language, LineLayer, MapEvent, MapFactory, MapHandle, MapOptions, MarkerId, MarkerSpec,
};
use crate::page::{Container, Page, Panel};
use crate::resync::Delay;
use crate::storage::Clock;
use crate::types::LngLat;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub body: Option<String>,
}

/// Answers from canned responses; unknown URLs fail like a refused
/// connection. One URL can be routed to a live [`RoutesCacheEndpoint`].
#[derive(Default)]
pub(crate) struct FakeTransport {
    responses: RefCell<HashMap<(&'static str, String), HttpResponse>>,
    endpoint: Option<(String, Rc<RoutesCacheEndpoint>)>,
    requests: RefCell<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_endpoint(url: &str, endpoint: Rc<RoutesCacheEndpoint>) -> Self {
        Self {
            endpoint: Some((url.to_owned(), endpoint)),
            ..Self::default()
        }
    }

    pub fn on_get(&self, url: &str, status: StatusCode, body: &str) {
        self.respond("GET", url, status, body);
    }

    pub fn on_post(&self, url: &str, status: StatusCode, body: &str) {
        self.respond("POST", url, status, body);
    }

    fn respond(&self, method: &'static str, url: &str, status: StatusCode, body: &str) {
        self.responses
            .borrow_mut()
            .insert((method, url.to_owned()), HttpResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.borrow().clone()
    }

    pub fn count(&self, method: &str, url: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    fn answer(&self, method: &'static str, url: &str, body: Option<String>) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            method,
            url: url.to_owned(),
            body: body.clone(),
        });

        if let Some((endpoint_url, endpoint)) = &self.endpoint {
            if endpoint_url == url {
                let response = match method {
                    "POST" => endpoint.post(body.as_deref().unwrap_or_default()),
                    _ => endpoint.get(),
                };
                return Ok(response.into());
            }
        }

        self.responses
            .borrow()
            .get(&(method, url.to_owned()))
            .cloned()
            .ok_or_else(|| RouteMapError::Network(format!("connection refused: {}", url)))
    }
}

#[async_trait(?Send)]
impl HttpTransport for FakeTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        self.answer("GET", url, None)
    }

    async fn post_json(&self, url: &str, body: String) -> Result<HttpResponse> {
        self.answer("POST", url, Some(body))
    }
}

pub(crate) struct FixedClock {
    now: Cell<DateTime<Utc>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        Self {
            now: Cell::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }
}

impl FixedClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// Records what was drawn instead of drawing it.
pub(crate) struct FakeMap {
    pub options: MapOptions,
    sources: RefCell<HashMap<String, Feature>>,
    layers: RefCell<Vec<LineLayer>>,
    markers: RefCell<BTreeMap<MarkerId, MarkerSpec>>,
    next_marker: Cell<MarkerId>,
    resizes: Cell<usize>,
    set_data_calls: Cell<usize>,
    fail_layers: Cell<bool>,
    listeners: RefCell<Vec<(MapEvent, Box<dyn FnMut()>)>>,
    error_listeners: RefCell<Vec<Box<dyn FnMut(String)>>>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self::new(MapOptions {
            container_id: "map".to_owned(),
            access_token: String::new(),
            style: String::new(),
            center: [0.0, 0.0],
            zoom: 1.0,
            language: Language::En,
        })
    }
}

impl FakeMap {
    pub fn new(options: MapOptions) -> Self {
        Self {
            options,
            sources: RefCell::default(),
            layers: RefCell::default(),
            markers: RefCell::default(),
            next_marker: Cell::new(1),
            resizes: Cell::new(0),
            set_data_calls: Cell::new(0),
            fail_layers: Cell::new(false),
            listeners: RefCell::default(),
            error_listeners: RefCell::default(),
        }
    }

    pub fn fail_layers(&self) {
        self.fail_layers.set(true);
    }

    pub fn source_coordinates(&self, id: &str) -> Option<Vec<LngLat>> {
        let sources = self.sources.borrow();
        let geometry = sources.get(id)?.geometry.as_ref()?;
        match &geometry.value {
            Value::LineString(positions) => {
                Some(positions.iter().map(|p| [p[0], p[1]]).collect())
            }
            _ => None,
        }
    }

    pub fn layers(&self) -> Vec<LineLayer> {
        self.layers.borrow().clone()
    }

    pub fn marker_positions(&self) -> Vec<LngLat> {
        self.markers.borrow().values().map(|m| m.position).collect()
    }

    pub fn resize_count(&self) -> usize {
        self.resizes.get()
    }

    pub fn set_data_count(&self) -> usize {
        self.set_data_calls.get()
    }

    /// A style swap drops custom sources and layers but keeps markers.
    pub fn clear_style(&self) {
        self.sources.borrow_mut().clear();
        self.layers.borrow_mut().clear();
    }

    pub fn fire(&self, event: MapEvent) {
        let mut listeners = self.listeners.take();
        for (subscribed, listener) in listeners.iter_mut() {
            if *subscribed == event {
                listener();
            }
        }
        listeners.append(&mut self.listeners.borrow_mut());
        *self.listeners.borrow_mut() = listeners;
    }

    pub fn fire_error(&self, message: &str) {
        for listener in self.error_listeners.borrow_mut().iter_mut() {
            listener(message.to_owned());
        }
    }
}

impl MapHandle for FakeMap {
    fn has_source(&self, id: &str) -> bool {
        self.sources.borrow().contains_key(id)
    }

    fn add_geojson_source(&self, id: &str, data: &Feature) -> Result<()> {
        let mut sources = self.sources.borrow_mut();
        if sources.contains_key(id) {
            return Err(RouteMapError::Map(format!("source {} already exists", id)));
        }
        sources.insert(id.to_owned(), data.clone());
        Ok(())
    }

    fn set_source_data(&self, id: &str, data: &Feature) -> Result<()> {
        let mut sources = self.sources.borrow_mut();
        let source = sources
            .get_mut(id)
            .ok_or_else(|| RouteMapError::Map(format!("no source {}", id)))?;
        *source = data.clone();
        self.set_data_calls.set(self.set_data_calls.get() + 1);
        Ok(())
    }

    fn add_line_layer(&self, layer: &LineLayer) -> Result<()> {
        if self.fail_layers.get() {
            return Err(RouteMapError::Map("layer rejected".to_owned()));
        }
        self.layers.borrow_mut().push(layer.clone());
        Ok(())
    }

    fn add_marker(&self, marker: &MarkerSpec) -> Result<MarkerId> {
        let id = self.next_marker.get();
        self.next_marker.set(id + 1);
        self.markers.borrow_mut().insert(id, marker.clone());
        Ok(id)
    }

    fn remove_marker(&self, id: MarkerId) {
        self.markers.borrow_mut().remove(&id);
    }

    fn resize(&self) {
        self.resizes.set(self.resizes.get() + 1);
    }

    fn on(&self, event: MapEvent, listener: Box<dyn FnMut()>) {
        self.listeners.borrow_mut().push((event, listener));
    }

    fn on_error(&self, listener: Box<dyn FnMut(String)>) {
        self.error_listeners.borrow_mut().push(listener);
    }
}

#[derive(Default)]
pub(crate) struct FakeMapFactory {
    maps: RefCell<Vec<Rc<FakeMap>>>,
}

impl FakeMapFactory {
    pub fn map_for(&self, container_id: &str) -> Option<Rc<FakeMap>> {
        self.maps
            .borrow()
            .iter()
            .find(|map| map.options.container_id == container_id)
            .cloned()
    }

    pub fn created(&self) -> usize {
        self.maps.borrow().len()
    }
}

impl MapFactory for FakeMapFactory {
    fn create(&self, options: &MapOptions) -> Result<Rc<dyn MapHandle>> {
        let map = Rc::new(FakeMap::new(options.clone()));
        self.maps.borrow_mut().push(map.clone());
        Ok(map)
    }
}

pub(crate) struct FakeContainer {
    id: String,
    size: RefCell<Option<(String, String)>>,
}

impl FakeContainer {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            size: RefCell::new(None),
        }
    }

    pub fn size(&self) -> Option<(String, String)> {
        self.size.borrow().clone()
    }
}

impl Container for FakeContainer {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn set_size(&self, width: &str, height: &str) -> Result<()> {
        *self.size.borrow_mut() = Some((width.to_owned(), height.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePage {
    containers: HashMap<String, Rc<FakeContainer>>,
    locale: Option<String>,
}

impl FakePage {
    pub fn with_containers(ids: &[&str]) -> Self {
        Self {
            containers: ids
                .iter()
                .map(|id| (id.to_string(), Rc::new(FakeContainer::new(id))))
                .collect(),
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_owned());
        self
    }
}

impl Page for FakePage {
    fn container(&self, id: &str) -> Option<Rc<dyn Container>> {
        self.containers
            .get(id)
            .map(|container| container.clone() as Rc<dyn Container>)
    }

    fn locale(&self) -> Option<String> {
        self.locale.clone()
    }
}

/// Answers `element_ids` from a fixed selector table and records the
/// selectors asked for.
#[derive(Default)]
pub(crate) struct FakePanel {
    elements: HashMap<String, Vec<String>>,
    queried: RefCell<Vec<String>>,
}

impl FakePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, ids: &[&str]) -> Self {
        self.elements.insert(
            selector.to_owned(),
            ids.iter().map(|id| id.to_string()).collect(),
        );
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }
}

impl Panel for FakePanel {
    fn element_ids(&self, selector: &str) -> Vec<String> {
        self.queried.borrow_mut().push(selector.to_owned());
        self.elements.get(selector).cloned().unwrap_or_default()
    }
}

/// Sleeps until the test calls [`ManualDelay::elapse`].
#[derive(Default)]
pub(crate) struct ManualDelay {
    requested: RefCell<Vec<u32>>,
    pending: RefCell<Vec<oneshot::Sender<()>>>,
}

impl ManualDelay {
    pub fn requested(&self) -> Vec<u32> {
        self.requested.borrow().clone()
    }

    /// Wakes every sleep started so far.
    pub fn elapse(&self) {
        for wake in self.pending.take() {
            let _ = wake.send(());
        }
    }
}

impl Delay for ManualDelay {
    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        let (wake, woken) = oneshot::channel();
        self.requested.borrow_mut().push(millis);
        self.pending.borrow_mut().push(wake);
        async move {
            let _ = woken.await;
        }
        .boxed_local()
    }
}
