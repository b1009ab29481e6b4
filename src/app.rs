//! Page bootstrap: config, then routes, then one map session per route.

use std::rc::Rc;

use futures::task::LocalSpawn;

use crate::config::{load_config, Settings};
use crate::directions::DirectionsClient;
use crate::error::{Result, RouteMapError};
use crate::geometry::GeometryResolver;
use crate::http::HttpTransport;
use crate::map::{Language, MapFactory};
use crate::page::Page;
use crate::renderer::{RouteRenderer, RouteStyle};
use crate::route_store::RouteStoreClient;
use crate::session::{SessionContext, SessionManager};
use crate::storage::{Clock, KeyValueStore};

/// The outside world as seen by the page bootstrap.
pub struct Environment {
    pub transport: Rc<dyn HttpTransport>,
    pub store: Rc<dyn KeyValueStore>,
    pub clock: Rc<dyn Clock>,
    pub page: Rc<dyn Page>,
    pub maps: Rc<dyn MapFactory>,
    pub spawner: Rc<dyn LocalSpawn>,
    pub settings: Settings,
}

/// Loads config and routes and creates a map session for every route whose
/// container is on the page.
///
/// Only a config failure is returned as an error. Route list failures leave
/// the page without maps, and a missing container or a failing session only
/// skips its own route.
pub async fn initialize(env: &Environment) -> Result<SessionManager> {
    let settings = &env.settings;
    let config = load_config(env.transport.as_ref(), &settings.config_url)
        .await
        .inspect_err(|e| log::error!("Failed to load config: {}", e))?;

    let routes = RouteStoreClient::new(
        env.transport.clone(),
        env.spawner.clone(),
        settings.routes_cache_url.clone(),
    )
    .load_routes(&config.routes_url)
    .await;
    log::info!("{} routes to draw", routes.len());

    let directions = DirectionsClient::new(
        env.transport.clone(),
        settings.directions_base_url.clone(),
        settings.directions_profile.clone(),
        config.access_token.clone(),
    );
    let resolver = GeometryResolver::new(
        directions,
        env.store.clone(),
        env.clock.clone(),
        settings.geometry_cache_policy(),
    );
    let renderer = RouteRenderer::new(
        Rc::new(resolver),
        RouteStyle {
            line_color: settings.line_color.clone(),
            line_width: settings.line_width,
            marker_image_url: config.marker_image_url.clone(),
            marker_size_px: settings.marker_size_px,
            marker_mode: settings.marker_mode,
        },
    );
    let context = SessionContext {
        maps: env.maps.clone(),
        renderer: Rc::new(renderer),
        spawner: env.spawner.clone(),
        access_token: config.access_token.clone(),
        language: Language::resolve(env.page.locale().as_deref()),
    };

    let mut sessions = SessionManager::new();
    for route in routes {
        let Some(container) = env.page.container(&route.id) else {
            log::error!("{}", RouteMapError::MissingContainer(route.id));
            continue;
        };
        let route_id = route.id.clone();
        if let Err(e) = sessions.create_session(container.as_ref(), route, settings, &context) {
            log::error!("Could not create map for route {}: {}", route_id, e);
        }
    }
    Ok(sessions)
}
