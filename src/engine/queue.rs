use std::sync::Arc;

use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::store::{DispatchStore, StoreResult};

/// View over the deliveries waiting for a driver.
pub struct DeliveryQueue {
    store: Arc<dyn DispatchStore>,
}

impl DeliveryQueue {
    pub fn new(store: Arc<dyn DispatchStore>) -> Self {
        Self { store }
    }

    /// Pending, unassigned deliveries, oldest first.
    pub async fn pending(&self) -> StoreResult<Vec<Delivery>> {
        let mut pending = self
            .store
            .list_deliveries_by_status(DeliveryStatus::Pending)
            .await?;
        pending.retain(Delivery::is_awaiting_assignment);
        Ok(pending)
    }

    pub async fn enqueue(&self, delivery: Delivery) -> StoreResult<Delivery> {
        self.store.insert_delivery(delivery).await
    }
}
