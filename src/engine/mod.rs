pub mod assignment;
pub mod pool;
pub mod queue;
pub mod scoring;

use std::time::Duration;

use thiserror::Error;

use crate::config::Config;
use crate::routing::RouteError;
use crate::store::StoreError;

pub use assignment::{run_dispatch_loop, DispatchEngine};
pub use pool::DriverPool;
pub use queue::DeliveryQueue;

/// Per-delivery failure while assigning. Geofence exclusion is a policy skip
/// and never shows up here.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no available driver")]
    NoAvailableDriver,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub load_penalty_weight: f64,
    pub max_driver_load: u32,
    pub routing_timeout: Duration,
    pub commit_retries: u32,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            load_penalty_weight: 2.0,
            max_driver_load: 1,
            routing_timeout: Duration::from_secs(5),
            commit_retries: 1,
        }
    }
}

impl From<&Config> for DispatchSettings {
    fn from(config: &Config) -> Self {
        Self {
            load_penalty_weight: config.load_penalty_weight,
            max_driver_load: config.max_driver_load,
            routing_timeout: config.routing_timeout(),
            commit_retries: config.commit_retries,
        }
    }
}
