//! Browser entry points and the DOM, storage and Mapbox GL bindings behind
//! them.

mod dom;
mod mapbox;

use std::cell::RefCell;
use std::rc::Rc;

use log::Level;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::app::{initialize, Environment};
use crate::config::Settings;
use crate::error::{Result, RouteMapError};
use crate::http::ReqwestTransport;
use crate::resync::PanelResync;
use crate::session::SessionManager;
use crate::storage::SystemClock;

pub use dom::{
    install_resync_hook, BrowserDelay, BrowserSpawner, DomContainer, DomPage, DomPanel,
    LocalStorageStore,
};
pub use mapbox::{MapboxFactory, WebMap};

thread_local! {
    // Map listeners only hold weak references to their sessions.
    static SESSIONS: RefCell<Option<Rc<SessionManager>>> = const { RefCell::new(None) };
}

#[wasm_bindgen]
pub fn rust_init(level: Option<String>) {
    let level = level
        .as_deref()
        .and_then(|level| level.parse::<Level>().ok())
        .unwrap_or(Level::Info);
    if let Err(e) = console_log::init_with_level(level) {
        web_sys::console::error_1(&JsValue::from_str(&e.to_string()));
        return;
    }
    log::info!("Logger initialized from library");
}

/// Draws every route on the current page.
///
/// `settings` is an optional JSON object overriding [`Settings`] defaults.
/// Resolves with the number of maps created.
#[wasm_bindgen]
pub fn start_route_maps(settings: Option<String>) -> js_sys::Promise {
    future_to_promise(async move {
        match start(settings.as_deref()).await {
            Ok(count) => Ok(JsValue::from(count as u32)),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        }
    })
}

async fn start(settings: Option<&str>) -> Result<usize> {
    let settings = match settings {
        Some(json) => Settings::from_json(json)?,
        None => Settings::default(),
    };
    let window = web_sys::window().ok_or_else(|| RouteMapError::Map("no window".to_owned()))?;
    let document = window
        .document()
        .ok_or_else(|| RouteMapError::Map("no document".to_owned()))?;

    let location = window.location();
    let path = location.pathname().map_err(mapbox::js_error)?;
    if !settings.is_active_for(&path) {
        log::debug!("Route maps disabled on {}", path);
        return Ok(0);
    }
    let origin = location.origin().map_err(mapbox::js_error)?;

    let env = Environment {
        transport: Rc::new(ReqwestTransport::with_base(&origin)?),
        store: Rc::new(LocalStorageStore::open(&window)?),
        clock: Rc::new(SystemClock),
        page: Rc::new(DomPage::new(window.clone(), document.clone())),
        maps: Rc::new(MapboxFactory::new(document.clone())),
        spawner: Rc::new(BrowserSpawner),
        settings,
    };
    let sessions = Rc::new(initialize(&env).await?);
    let count = sessions.len();
    SESSIONS.with(|slot| *slot.borrow_mut() = Some(sessions.clone()));

    let settings = &env.settings;
    let resync = PanelResync::new(
        sessions,
        env.spawner.clone(),
        Rc::new(BrowserDelay::new(window.clone())),
        settings.map_selector.clone(),
        settings.resync_delay_ms,
    );
    install_resync_hook(
        &window,
        &document,
        Rc::new(resync),
        &settings.panel_selector,
        &settings.panel_shown_event,
    )?;
    log::info!("{} route maps started", count);
    Ok(count)
}
