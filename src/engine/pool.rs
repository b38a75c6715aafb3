use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::engine::scoring::rank_candidates;
use crate::engine::DispatchError;
use crate::models::driver::{Driver, GeoPoint};
use crate::store::DispatchStore;

pub struct DriverPool {
    store: Arc<dyn DispatchStore>,
    load_penalty_weight: f64,
    max_load: u32,
}

impl DriverPool {
    pub fn new(store: Arc<dyn DispatchStore>, load_penalty_weight: f64, max_load: u32) -> Self {
        Self {
            store,
            load_penalty_weight,
            max_load,
        }
    }

    /// Picks the best-scoring available driver and reserves it.
    ///
    /// Scoring works on a snapshot; the reservation itself is a conditional
    /// update in the store. A candidate taken by a concurrent cycle in between
    /// is skipped and the next one tried.
    pub async fn select_best_driver(&self, pickup: &GeoPoint) -> Result<Driver, DispatchError> {
        let drivers = self.store.list_drivers().await?;
        let ranked = rank_candidates(&drivers, pickup, self.load_penalty_weight);

        for (candidate, score) in ranked {
            match self.store.try_reserve_driver(candidate.id, self.max_load).await? {
                Some(reserved) => {
                    debug!(driver_id = %reserved.id, score, "driver reserved");
                    return Ok(reserved);
                }
                None => {
                    debug!(driver_id = %candidate.id, "driver taken concurrently, trying next");
                }
            }
        }

        Err(DispatchError::NoAvailableDriver)
    }

    pub async fn release(&self, driver_id: Uuid) -> Result<Driver, DispatchError> {
        Ok(self.store.release_driver(driver_id, self.max_load).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::DriverPool;
    use crate::engine::DispatchError;
    use crate::models::driver::{Driver, GeoPoint};
    use crate::store::{DispatchStore, InMemoryStore};

    async fn seeded(drivers: &[(u128, f64, f64)]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for &(seed, lat, lng) in drivers {
            store
                .insert_driver(Driver {
                    id: Uuid::from_u128(seed),
                    ..Driver::new(format!("driver-{seed}"), GeoPoint::new(lat, lng))
                })
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn selection_reserves_only_the_winner() {
        let store = seeded(&[(1, 14.60, 121.08), (2, 14.5548, 121.0245)]).await;
        let pool = DriverPool::new(store.clone(), 2.0, 1);

        let chosen = pool
            .select_best_driver(&GeoPoint::new(14.5547, 121.0244))
            .await
            .unwrap();

        assert_eq!(chosen.id, Uuid::from_u128(2));
        assert_eq!(chosen.current_load, 1);
        assert!(!chosen.available);

        let other = store.get_driver(Uuid::from_u128(1)).await.unwrap();
        assert_eq!(other.current_load, 0);
        assert!(other.available);
    }

    #[tokio::test]
    async fn exhausted_pool_reports_no_available_driver() {
        let store = seeded(&[(1, 14.55, 121.02)]).await;
        let pool = DriverPool::new(store, 2.0, 1);
        let pickup = GeoPoint::new(14.55, 121.02);

        pool.select_best_driver(&pickup).await.unwrap();
        let second = pool.select_best_driver(&pickup).await;

        assert!(matches!(second, Err(DispatchError::NoAvailableDriver)));
    }

    #[tokio::test]
    async fn release_restores_availability() {
        let store = seeded(&[(1, 14.55, 121.02)]).await;
        let pool = DriverPool::new(store, 2.0, 1);
        let pickup = GeoPoint::new(14.55, 121.02);

        let driver = pool.select_best_driver(&pickup).await.unwrap();
        let released = pool.release(driver.id).await.unwrap();

        assert!(released.available);
        assert_eq!(pool.select_best_driver(&pickup).await.unwrap().id, driver.id);
    }
}
