use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::error::{Result, RouteMapError};
use crate::http::HttpTransport;
use crate::types::Route;

/// Reads the route list from the backend cache, falling back to the static
/// routes file and repopulating the cache from it.
pub struct RouteStoreClient {
    transport: Rc<dyn HttpTransport>,
    spawner: Rc<dyn LocalSpawn>,
    cache_url: String,
}

impl RouteStoreClient {
    pub fn new(
        transport: Rc<dyn HttpTransport>,
        spawner: Rc<dyn LocalSpawn>,
        cache_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            spawner,
            cache_url: cache_url.into(),
        }
    }

    /// Never fails: when neither source answers the list is empty and the
    /// reason is logged.
    pub async fn load_routes(&self, fallback_url: &str) -> Vec<Route> {
        match self.try_load(fallback_url).await {
            Ok(routes) => routes,
            Err(e) => {
                log::error!("Error fetching routes: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_load(&self, fallback_url: &str) -> Result<Vec<Route>> {
        match self.transport.get(&self.cache_url).await {
            Ok(response) if response.is_success() => {
                let routes = response
                    .json()
                    .map_err(|e| RouteMapError::RouteListFetch(format!("cached routes: {}", e)))?;
                log::info!("Routes loaded from cache.");
                return Ok(routes);
            }
            Ok(response) => {
                log::info!("Cache not found ({}), fetching routes from {}", response.status, fallback_url);
            }
            Err(e) => {
                log::warn!("Routes cache unreachable ({}), fetching routes from {}", e, fallback_url);
            }
        }

        let response = self
            .transport
            .get(fallback_url)
            .await?
            .error_for_status(fallback_url)?;
        let routes: Vec<Route> = response
            .json()
            .map_err(|e| RouteMapError::RouteListFetch(format!("{}: {}", fallback_url, e)))?;
        self.spawn_cache_write(&routes);
        Ok(routes)
    }

    /// Best effort: the write runs detached, nobody waits for it and its
    /// failure only reaches the log.
    fn spawn_cache_write(&self, routes: &[Route]) {
        let body = match serde_json::to_string(routes) {
            Ok(body) => body,
            Err(e) => {
                log::error!("Error caching routes: {}", e);
                return;
            }
        };
        let transport = self.transport.clone();
        let url = self.cache_url.clone();
        let task = async move {
            if let Err(e) = write_cache(transport.as_ref(), &url, body).await {
                log::error!("Error caching routes: {}", e);
            }
        };
        if let Err(e) = self.spawner.spawn_local(task) {
            log::error!("Error caching routes: {}", e);
        }
    }
}

async fn write_cache(transport: &dyn HttpTransport, url: &str, body: String) -> Result<()> {
    let response = transport
        .post_json(url, body)
        .await
        .map_err(|e| RouteMapError::CacheWrite(e.to_string()))?;
    if !response.is_success() {
        return Err(RouteMapError::CacheWrite(format!(
            "{} answered {}",
            url, response.status
        )));
    }
    log::info!("Routes cached successfully.");
    Ok(())
}
