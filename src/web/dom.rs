use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, LocalFutureObj};
use futures::task::{LocalSpawn, SpawnError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use super::mapbox::{js_error, js_message};
use crate::error::{Result, RouteMapError};
use crate::page::{Container, Page, Panel};
use crate::resync::{Delay, PanelResync};
use crate::storage::KeyValueStore;

pub struct DomPage {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl DomPage {
    pub fn new(window: web_sys::Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }
}

impl Page for DomPage {
    fn container(&self, id: &str) -> Option<Rc<dyn Container>> {
        let element = self.document.get_element_by_id(id)?;
        let element = element.dyn_into::<web_sys::HtmlElement>().ok()?;
        Some(Rc::new(DomContainer(element)))
    }

    fn locale(&self) -> Option<String> {
        self.window.navigator().language()
    }
}

pub struct DomContainer(web_sys::HtmlElement);

impl Container for DomContainer {
    fn id(&self) -> String {
        self.0.id()
    }

    fn set_size(&self, width: &str, height: &str) -> Result<()> {
        let style = self.0.style();
        style.set_property("width", width).map_err(js_error)?;
        style.set_property("height", height).map_err(js_error)?;
        Ok(())
    }
}

/// `window.localStorage`.
pub struct LocalStorageStore(web_sys::Storage);

impl LocalStorageStore {
    pub fn open(window: &web_sys::Window) -> Result<Self> {
        window
            .local_storage()
            .map_err(|e| RouteMapError::Storage(js_message(&e)))?
            .map(Self)
            .ok_or_else(|| RouteMapError::Storage("localStorage is not available".to_owned()))
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.0
            .get_item(key)
            .map_err(|e| RouteMapError::Storage(js_message(&e)))
    }

    // Quota errors surface here.
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.0
            .set_item(key, value)
            .map_err(|e| RouteMapError::Storage(js_message(&e)))
    }
}

/// Runs spawned tasks on the browser's microtask queue.
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> std::result::Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

#[wasm_bindgen]
extern "C" {
    type JQuery;

    #[wasm_bindgen(js_name = jQuery)]
    fn jquery(element: &web_sys::Element) -> JQuery;

    #[wasm_bindgen(method)]
    fn on(this: &JQuery, events: &str, handler: &JsValue) -> JQuery;
}

fn has_jquery(window: &web_sys::Window) -> bool {
    js_sys::Reflect::get(window, &JsValue::from_str("jQuery"))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

pub struct DomPanel(web_sys::Element);

impl Panel for DomPanel {
    fn element_ids(&self, selector: &str) -> Vec<String> {
        let Ok(elements) = self.0.query_selector_all(selector) else {
            return Vec::new();
        };
        (0..elements.length())
            .filter_map(|index| elements.item(index))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(|element| element.id())
            .collect()
    }
}

/// `setTimeout` as a future.
pub struct BrowserDelay {
    window: web_sys::Window,
}

impl BrowserDelay {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }
}

impl Delay for BrowserDelay {
    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()> {
        let window = self.window.clone();
        let timeout = i32::try_from(millis).unwrap_or(i32::MAX);
        async move {
            let promise = js_sys::Promise::new(&mut |resolve, _reject| {
                if let Err(e) =
                    window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout)
                {
                    log::error!("Could not schedule map resize: {}", js_message(&e));
                }
            });
            let _ = JsFuture::from(promise).await;
        }
        .boxed_local()
    }
}

/// Calls [`PanelResync::panel_shown`] whenever a panel matching
/// `panel_selector` emits `shown_event`.
///
/// Bootstrap 3 and 4 raise their collapse events through jQuery only, so the
/// listener goes through jQuery when the page has it and is a plain DOM
/// listener otherwise.
pub fn install_resync_hook(
    window: &web_sys::Window,
    document: &web_sys::Document,
    resync: Rc<PanelResync>,
    panel_selector: &str,
    shown_event: &str,
) -> Result<()> {
    let use_jquery = has_jquery(window);
    let panels = document.query_selector_all(panel_selector).map_err(js_error)?;
    for index in 0..panels.length() {
        let Some(panel) = panels
            .item(index)
            .and_then(|node| node.dyn_into::<web_sys::Element>().ok())
        else {
            continue;
        };
        let resync = resync.clone();
        let shown_panel = DomPanel(panel.clone());
        let on_shown = Closure::<dyn FnMut()>::new(move || resync.panel_shown(&shown_panel));
        if use_jquery {
            jquery(&panel).on(shown_event, on_shown.as_ref());
        } else {
            panel
                .add_event_listener_with_callback(shown_event, on_shown.as_ref().unchecked_ref())
                .map_err(js_error)?;
        }
        // The panels live as long as the page.
        on_shown.forget();
    }
    log::debug!(
        "Resync hook bound to {} panels{}",
        panels.length(),
        if use_jquery { " through jQuery" } else { "" }
    );
    Ok(())
}
