//! Draws driving routes on Mapbox GL maps embedded in a page.
//!
//! Each route is shown in the page element whose id matches the route id.
//! The route list comes from a server-side cache with a static file as
//! fallback, and route geometry from the Mapbox directions API, memoized in
//! `localStorage`.

pub mod app;
pub mod backend;
pub mod config;
pub mod directions;
pub mod error;
pub mod geometry;
pub mod http;
pub mod map;
pub mod page;
pub mod renderer;
pub mod resync;
pub mod route_store;
pub mod session;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use app::{initialize, Environment};
pub use config::{load_config, Config, MarkerMode, Settings};
pub use error::{Result, RouteMapError};
pub use geometry::{GeometryCachePolicy, GeometryResolver};
pub use resync::{Delay, PanelResync};
pub use route_store::RouteStoreClient;
pub use session::{MapSession, SessionManager};
pub use types::{LngLat, Route, RouteGeometry};
