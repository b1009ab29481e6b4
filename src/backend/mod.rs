//! Server half of the route list cache.
//!
//! The page reads `GET /wp-json/custom-routes/v1/routes` and repopulates it
//! with `POST` on a miss. These handlers hold the endpoint's behaviour free of
//! any particular web framework; hosting them is left to the embedding
//! server.

pub mod endpoint;
pub mod transient;

pub use endpoint::{routes_ttl, EndpointResponse, RoutesCacheEndpoint, ROUTES_TRANSIENT_KEY};
pub use transient::{MemoryTransientStore, TransientStore};
