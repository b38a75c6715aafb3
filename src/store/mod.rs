//! Persistence boundary of the dispatch engine.
//!
//! The engine needs plain CRUD plus two atomic operations: a conditional
//! driver reservation and the assignment commit.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::activity::ActivityLogEntry;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::{Driver, GeoPoint};
use crate::models::geofence::Geofence;
use crate::models::route::Route;

pub use memory::InMemoryStore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Write set of a successful assignment.
#[derive(Debug, Clone)]
pub struct AssignmentCommit {
    pub delivery_id: Uuid,
    pub driver_id: Uuid,
    pub eta_minutes: f64,
    pub route: Route,
}

#[async_trait]
pub trait DispatchStore: Send + Sync {
    async fn insert_driver(&self, driver: Driver) -> StoreResult<Driver>;
    async fn get_driver(&self, id: Uuid) -> StoreResult<Driver>;
    async fn list_drivers(&self) -> StoreResult<Vec<Driver>>;
    async fn update_driver_location(&self, id: Uuid, location: GeoPoint) -> StoreResult<Driver>;

    /// Takes one unit of the driver's capacity only if the driver is still
    /// available. `Ok(None)` means another reservation won.
    async fn try_reserve_driver(&self, id: Uuid, max_load: u32) -> StoreResult<Option<Driver>>;
    async fn release_driver(&self, id: Uuid, max_load: u32) -> StoreResult<Driver>;

    async fn insert_delivery(&self, delivery: Delivery) -> StoreResult<Delivery>;
    async fn get_delivery(&self, id: Uuid) -> StoreResult<Delivery>;
    async fn list_deliveries(&self) -> StoreResult<Vec<Delivery>>;
    async fn list_deliveries_by_status(&self, status: DeliveryStatus) -> StoreResult<Vec<Delivery>>;

    /// Applies a manual status transition. Reaching `Delivered` releases the
    /// assigned driver in the same step.
    async fn update_delivery_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        max_load: u32,
    ) -> StoreResult<Delivery>;

    /// Sets the delivery to assigned and stores its route, or fails with
    /// `Conflict` and applies nothing. Besides a delivery that is no longer
    /// pending, a backend may report a transient write conflict on a delivery
    /// that is still pending; the engine retries those.
    async fn commit_assignment(&self, commit: AssignmentCommit) -> StoreResult<Delivery>;

    async fn get_route(&self, delivery_id: Uuid) -> StoreResult<Route>;

    async fn insert_geofence(&self, geofence: Geofence) -> StoreResult<Geofence>;
    async fn list_geofences(&self) -> StoreResult<Vec<Geofence>>;
    async fn delete_geofence(&self, id: Uuid) -> StoreResult<Geofence>;

    async fn append_activity(&self, entry: ActivityLogEntry) -> StoreResult<()>;
    /// Newest first.
    async fn recent_activity(&self, limit: usize) -> StoreResult<Vec<ActivityLogEntry>>;
}
