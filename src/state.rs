use std::sync::Arc;

use tracing::warn;

use crate::engine::{DispatchEngine, DispatchSettings};
use crate::eta::EtaEstimator;
use crate::models::activity::{ActivityKind, ActivityLogEntry};
use crate::observability::metrics::Metrics;
use crate::routing::RoutingProvider;
use crate::store::DispatchStore;

pub struct AppState {
    pub store: Arc<dyn DispatchStore>,
    pub engine: Arc<DispatchEngine>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        router: Arc<dyn RoutingProvider>,
        eta: Arc<dyn EtaEstimator>,
        settings: DispatchSettings,
        event_buffer_size: usize,
    ) -> Self {
        let metrics = Metrics::new();
        let engine = Arc::new(DispatchEngine::new(
            store.clone(),
            router,
            eta,
            settings,
            metrics.clone(),
            event_buffer_size,
        ));

        Self {
            store,
            engine,
            metrics,
        }
    }

    /// Appends to the activity log; a failing log write never fails the caller.
    pub async fn record_activity(&self, kind: ActivityKind, details: String) {
        if let Err(err) = self
            .store
            .append_activity(ActivityLogEntry::new(kind, details))
            .await
        {
            warn!(error = %err, activity = ?kind, "failed to write activity log");
        }
    }
}
