use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::driver::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Assigned,
    InTransit,
    Delivered,
}

impl DeliveryStatus {
    fn rank(self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::Assigned => 1,
            DeliveryStatus::InTransit => 2,
            DeliveryStatus::Delivered => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == DeliveryStatus::Delivered
    }

    /// Manual transitions only move forward from an assigned delivery.
    /// Pending to assigned belongs to the dispatch engine.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        self != DeliveryStatus::Pending && next.rank() > self.rank()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub status: DeliveryStatus,
    pub assigned_driver: Option<Uuid>,
    pub eta_minutes: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(pickup: GeoPoint, dropoff: GeoPoint) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            pickup,
            dropoff,
            status: DeliveryStatus::Pending,
            assigned_driver: None,
            eta_minutes: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_awaiting_assignment(&self) -> bool {
        self.status == DeliveryStatus::Pending && self.assigned_driver.is_none()
    }
}
