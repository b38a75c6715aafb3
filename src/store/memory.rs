use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::activity::ActivityLogEntry;
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::{Driver, GeoPoint};
use crate::models::geofence::Geofence;
use crate::models::route::Route;
use crate::store::{AssignmentCommit, DispatchStore, StoreError, StoreResult};

/// `DashMap`-backed store.
///
/// Entry guards give per-row atomicity. Whenever two maps are locked together
/// the order is deliveries, then drivers, then routes.
#[derive(Default)]
pub struct InMemoryStore {
    drivers: DashMap<Uuid, Driver>,
    deliveries: DashMap<Uuid, Delivery>,
    geofences: DashMap<Uuid, Geofence>,
    routes: DashMap<Uuid, Route>,
    activity: RwLock<Vec<ActivityLogEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn driver_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound(format!("driver {id} not found"))
}

fn delivery_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound(format!("delivery {id} not found"))
}

#[async_trait]
impl DispatchStore for InMemoryStore {
    async fn insert_driver(&self, driver: Driver) -> StoreResult<Driver> {
        self.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    async fn get_driver(&self, id: Uuid) -> StoreResult<Driver> {
        self.drivers
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| driver_not_found(id))
    }

    async fn list_drivers(&self) -> StoreResult<Vec<Driver>> {
        let mut drivers: Vec<Driver> = self
            .drivers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        drivers.sort_by_key(|d| d.id);
        Ok(drivers)
    }

    async fn update_driver_location(&self, id: Uuid, location: GeoPoint) -> StoreResult<Driver> {
        let mut driver = self.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
        driver.location = location;
        driver.updated_at = Utc::now();
        Ok(driver.clone())
    }

    async fn try_reserve_driver(&self, id: Uuid, max_load: u32) -> StoreResult<Option<Driver>> {
        let mut driver = self.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
        if driver.reserve(max_load) {
            Ok(Some(driver.clone()))
        } else {
            Ok(None)
        }
    }

    async fn release_driver(&self, id: Uuid, max_load: u32) -> StoreResult<Driver> {
        let mut driver = self.drivers.get_mut(&id).ok_or_else(|| driver_not_found(id))?;
        driver.release(max_load);
        Ok(driver.clone())
    }

    async fn insert_delivery(&self, delivery: Delivery) -> StoreResult<Delivery> {
        self.deliveries.insert(delivery.id, delivery.clone());
        Ok(delivery)
    }

    async fn get_delivery(&self, id: Uuid) -> StoreResult<Delivery> {
        self.deliveries
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| delivery_not_found(id))
    }

    async fn list_deliveries(&self) -> StoreResult<Vec<Delivery>> {
        let mut deliveries: Vec<Delivery> = self
            .deliveries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        deliveries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(deliveries)
    }

    async fn list_deliveries_by_status(
        &self,
        status: DeliveryStatus,
    ) -> StoreResult<Vec<Delivery>> {
        let mut deliveries = self.list_deliveries().await?;
        deliveries.retain(|d| d.status == status);
        Ok(deliveries)
    }

    async fn update_delivery_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        max_load: u32,
    ) -> StoreResult<Delivery> {
        let mut delivery = self
            .deliveries
            .get_mut(&id)
            .ok_or_else(|| delivery_not_found(id))?;

        if !delivery.status.can_transition_to(status) {
            return Err(StoreError::Conflict(format!(
                "delivery {id} cannot move from {:?} to {:?}",
                delivery.status, status
            )));
        }

        if status.is_terminal() {
            if let Some(driver_id) = delivery.assigned_driver {
                let mut driver = self
                    .drivers
                    .get_mut(&driver_id)
                    .ok_or_else(|| driver_not_found(driver_id))?;
                driver.release(max_load);
            }
        }

        delivery.status = status;
        delivery.updated_at = Utc::now();
        Ok(delivery.clone())
    }

    async fn commit_assignment(&self, commit: AssignmentCommit) -> StoreResult<Delivery> {
        let mut delivery = self
            .deliveries
            .get_mut(&commit.delivery_id)
            .ok_or_else(|| delivery_not_found(commit.delivery_id))?;

        if !delivery.is_awaiting_assignment() {
            return Err(StoreError::Conflict(format!(
                "delivery {} is no longer pending",
                commit.delivery_id
            )));
        }
        if !self.drivers.contains_key(&commit.driver_id) {
            return Err(driver_not_found(commit.driver_id));
        }

        self.routes.insert(commit.delivery_id, commit.route);

        delivery.status = DeliveryStatus::Assigned;
        delivery.assigned_driver = Some(commit.driver_id);
        delivery.eta_minutes = Some(commit.eta_minutes);
        delivery.updated_at = Utc::now();
        Ok(delivery.clone())
    }

    async fn get_route(&self, delivery_id: Uuid) -> StoreResult<Route> {
        self.routes
            .get(&delivery_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                StoreError::NotFound(format!("route for delivery {delivery_id} not found"))
            })
    }

    async fn insert_geofence(&self, geofence: Geofence) -> StoreResult<Geofence> {
        self.geofences.insert(geofence.id, geofence.clone());
        Ok(geofence)
    }

    async fn list_geofences(&self) -> StoreResult<Vec<Geofence>> {
        let mut geofences: Vec<Geofence> = self
            .geofences
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        geofences.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(geofences)
    }

    async fn delete_geofence(&self, id: Uuid) -> StoreResult<Geofence> {
        self.geofences
            .remove(&id)
            .map(|(_, geofence)| geofence)
            .ok_or_else(|| StoreError::NotFound(format!("geofence {id} not found")))
    }

    async fn append_activity(&self, entry: ActivityLogEntry) -> StoreResult<()> {
        self.activity.write().await.push(entry);
        Ok(())
    }

    async fn recent_activity(&self, limit: usize) -> StoreResult<Vec<ActivityLogEntry>> {
        let log = self.activity.read().await;
        Ok(log.iter().rev().take(limit).cloned().collect())
    }
}
