//! Map sessions: one live map per route, owned by a [`SessionManager`].

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::config::Settings;
use crate::error::{Result, RouteMapError};
use crate::map::{Language, MapEvent, MapFactory, MapHandle, MapOptions, MarkerId};
use crate::page::Container;
use crate::renderer::RouteRenderer;
use crate::types::Route;

pub struct MapSession {
    container_id: String,
    route: Route,
    map: Rc<dyn MapHandle>,
    placed_marker: Cell<Option<MarkerId>>,
}

impl MapSession {
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn map(&self) -> &Rc<dyn MapHandle> {
        &self.map
    }

    /// Draw the route now. Failures are logged with the route id; the map
    /// keeps whatever was drawn before the failing step.
    pub async fn render(&self, renderer: &RouteRenderer) {
        if let Err(e) = renderer
            .render(self.map.as_ref(), &self.route, &self.placed_marker)
            .await
        {
            log::error!("Error adding route {}: {}", self.route.id, e);
        }
    }

    fn subscribe(
        self: &Rc<Self>,
        renderer: Rc<RouteRenderer>,
        spawner: Rc<dyn LocalSpawn>,
    ) {
        for event in [MapEvent::Load, MapEvent::StyleData] {
            // The map owns the listener, so it must not own the session back.
            let session = Rc::downgrade(self);
            let renderer = renderer.clone();
            let spawner = spawner.clone();
            self.map.on(
                event,
                Box::new(move || schedule_render(&session, &renderer, spawner.as_ref(), event)),
            );
        }

        let route_id = self.route.id.clone();
        self.map.on_error(Box::new(move |message| {
            log::error!("Mapbox error on {}: {}", route_id, message);
        }));
    }
}

fn schedule_render(
    session: &Weak<MapSession>,
    renderer: &Rc<RouteRenderer>,
    spawner: &dyn LocalSpawn,
    event: MapEvent,
) {
    let Some(session) = session.upgrade() else {
        return;
    };
    log::debug!("{} on {}, drawing route", event.name(), session.container_id);
    let renderer = renderer.clone();
    let task = async move { session.render(&renderer).await };
    if let Err(e) = spawner.spawn_local(task) {
        log::error!("Could not schedule route rendering: {}", e);
    }
}

/// Everything a session needs besides its container and route.
pub struct SessionContext {
    pub maps: Rc<dyn MapFactory>,
    pub renderer: Rc<RouteRenderer>,
    pub spawner: Rc<dyn LocalSpawn>,
    pub access_token: String,
    pub language: Language,
}

/// Owns every live map of the page, keyed by container id.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<String, Rc<MapSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes `container`, creates its map centred on the route start and
    /// wires the render and error listeners.
    pub fn create_session(
        &mut self,
        container: &dyn Container,
        route: Route,
        settings: &Settings,
        context: &SessionContext,
    ) -> Result<Rc<MapSession>> {
        let container_id = container.id();
        if self.sessions.contains_key(&container_id) {
            return Err(RouteMapError::DuplicateContainer(container_id));
        }
        let center = route
            .start()
            .ok_or_else(|| RouteMapError::render(&route.id, "route has no coordinates"))?;

        container.set_size(&settings.container_width, &settings.container_height)?;

        let map = context.maps.create(&MapOptions {
            container_id: container_id.clone(),
            access_token: context.access_token.clone(),
            style: settings.map_style.clone(),
            center,
            zoom: settings.zoom,
            language: context.language,
        })?;

        let session = Rc::new(MapSession {
            container_id: container_id.clone(),
            route,
            map,
            placed_marker: Cell::new(None),
        });
        session.subscribe(context.renderer.clone(), context.spawner.clone());
        self.sessions.insert(container_id, session.clone());
        Ok(session)
    }

    pub fn get(&self, container_id: &str) -> Option<&Rc<MapSession>> {
        self.sessions.get(container_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Resize the maps living in the given containers, e.g. after a
    /// collapsed panel holding them was expanded. Ids without a map are
    /// skipped. Returns how many maps were resized.
    pub fn resize_maps<I, S>(&self, container_ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resized = 0;
        for id in container_ids {
            if let Some(session) = self.sessions.get(id.as_ref()) {
                session.map.resize();
                resized += 1;
            }
        }
        resized
    }
}
