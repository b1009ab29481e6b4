//! Resizing maps that were created inside a collapsed panel.
//!
//! A map measures its container when it is created; inside a collapsed panel
//! that is zero by zero. Once the panel has been expanded and its transition
//! has run, the maps inside it are resized.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::page::Panel;
use crate::session::SessionManager;

/// Resolves after a number of milliseconds on the page's event loop.
pub trait Delay {
    fn sleep(&self, millis: u32) -> LocalBoxFuture<'static, ()>;
}

pub struct PanelResync {
    sessions: Rc<SessionManager>,
    spawner: Rc<dyn LocalSpawn>,
    delay: Rc<dyn Delay>,
    map_selector: String,
    delay_ms: u32,
}

impl PanelResync {
    pub fn new(
        sessions: Rc<SessionManager>,
        spawner: Rc<dyn LocalSpawn>,
        delay: Rc<dyn Delay>,
        map_selector: impl Into<String>,
        delay_ms: u32,
    ) -> Self {
        Self {
            sessions,
            spawner,
            delay,
            map_selector: map_selector.into(),
            delay_ms,
        }
    }

    /// Handles the panel's "shown" event. The maps are looked up right away
    /// and resized once the delay has passed.
    pub fn panel_shown(&self, panel: &dyn Panel) {
        let ids = panel.element_ids(&self.map_selector);
        let sessions = self.sessions.clone();
        let wait = self.delay.sleep(self.delay_ms);
        let task = async move {
            wait.await;
            let resized = sessions.resize_maps(&ids);
            log::debug!("Resized {} maps after panel expanded", resized);
        };
        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("Could not schedule map resize: {}", e);
        }
    }
}
