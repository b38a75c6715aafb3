//! Pluggable route providers.
//!
//! - **`OsrmRouteProvider`**: calls an OSRM HTTP endpoint.
//! - **`StraightLineRouteProvider`**: great-circle line at a fixed average speed,
//!   no external dependencies.
//!
//! Every provider-specific failure shape is reported as a [`RouteError`].

pub mod osrm;
pub mod straight_line;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, RoutingProviderKind};
use crate::models::driver::GeoPoint;
use crate::models::route::RouteLeg;

pub use osrm::OsrmRouteProvider;
pub use straight_line::StraightLineRouteProvider;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing provider timed out after {0} ms")]
    Timeout(u64),

    #[error("no route found")]
    NoRoute,

    #[error("routing request failed: {0}")]
    Request(String),

    #[error("malformed routing response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn compute_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, RouteError>;
}

pub fn provider_from_config(config: &Config) -> Result<Arc<dyn RoutingProvider>, RouteError> {
    let provider: Arc<dyn RoutingProvider> = match config.routing_provider {
        RoutingProviderKind::Osrm => Arc::new(OsrmRouteProvider::new(
            &config.osrm_url,
            config.routing_timeout(),
        )?),
        RoutingProviderKind::StraightLine => {
            Arc::new(StraightLineRouteProvider::new(config.average_speed_kmh))
        }
    };
    Ok(provider)
}
