use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{timeout, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::{DeliveryQueue, DispatchError, DispatchSettings, DriverPool};
use crate::eta::EtaEstimator;
use crate::geo::GeofenceIndex;
use crate::models::activity::{ActivityKind, ActivityLogEntry};
use crate::models::assignment::{Assignment, CycleReport, DispatchOutcome};
use crate::models::delivery::{Delivery, DeliveryStatus};
use crate::models::driver::{Driver, GeoPoint};
use crate::models::route::{Route, RouteLeg};
use crate::observability::metrics::Metrics;
use crate::routing::{RouteError, RoutingProvider};
use crate::store::{AssignmentCommit, DispatchStore, StoreError};

/// Assigns pending deliveries to drivers.
///
/// The routing provider and ETA estimator are owned by the engine and live as
/// long as it does. The estimator can be swapped at runtime with
/// [`DispatchEngine::replace_eta_estimator`]; cycles already running keep the
/// instance they started the delivery with.
pub struct DispatchEngine {
    store: Arc<dyn DispatchStore>,
    pool: DriverPool,
    queue: DeliveryQueue,
    router: Arc<dyn RoutingProvider>,
    eta: RwLock<Arc<dyn EtaEstimator>>,
    settings: DispatchSettings,
    metrics: Metrics,
    events_tx: broadcast::Sender<Assignment>,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        router: Arc<dyn RoutingProvider>,
        eta: Arc<dyn EtaEstimator>,
        settings: DispatchSettings,
        metrics: Metrics,
        event_buffer_size: usize,
    ) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));

        Self {
            pool: DriverPool::new(
                store.clone(),
                settings.load_penalty_weight,
                settings.max_driver_load,
            ),
            queue: DeliveryQueue::new(store.clone()),
            store,
            router,
            eta: RwLock::new(eta),
            settings,
            metrics,
            events_tx,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn router(&self) -> Arc<dyn RoutingProvider> {
        self.router.clone()
    }

    pub async fn eta_estimator(&self) -> Arc<dyn EtaEstimator> {
        self.eta.read().await.clone()
    }

    pub async fn replace_eta_estimator(&self, eta: Arc<dyn EtaEstimator>) {
        *self.eta.write().await = eta;
        info!("eta estimator replaced");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Assignment> {
        self.events_tx.subscribe()
    }

    /// Name of the first geofence containing `point`.
    pub async fn check_geofence(&self, point: &GeoPoint) -> Result<Option<String>, StoreError> {
        let geofences = self.store.list_geofences().await?;
        let index = GeofenceIndex::build(&geofences);
        Ok(index.is_excluded(point).map(str::to_string))
    }

    /// Manual status change. When the delivery reaches `Delivered` the store
    /// frees its driver and the driver's load gauge is refreshed.
    pub async fn update_delivery_status(
        &self,
        id: Uuid,
        status: DeliveryStatus,
    ) -> Result<Delivery, StoreError> {
        let delivery = self
            .store
            .update_delivery_status(id, status, self.settings.max_driver_load)
            .await?;

        let released = delivery.assigned_driver.filter(|_| delivery.status.is_terminal());
        if let Some(driver_id) = released {
            match self.store.get_driver(driver_id).await {
                Ok(driver) => self.observe_driver_load(&driver),
                Err(err) => warn!(%driver_id, error = %err, "released driver not readable"),
            }
        }

        Ok(delivery)
    }

    /// One pass over every pending delivery. Only failing to read the backlog
    /// or the geofences aborts the cycle; everything else becomes an outcome.
    pub async fn run_assignment_cycle(&self) -> Result<CycleReport, StoreError> {
        let start = Instant::now();

        let pending = self.queue.pending().await?;
        let geofences = self.store.list_geofences().await?;
        let index = GeofenceIndex::build(&geofences);

        for (geofence_id, err) in index.skipped() {
            self.record(
                ActivityKind::MalformedGeofence,
                format!("Geofence {geofence_id} skipped: {err}"),
            )
            .await;
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for delivery in pending {
            let outcome = self.process_delivery(&index, delivery).await;
            self.metrics
                .dispatch_outcomes_total
                .with_label_values(&[outcome.label()])
                .inc();
            outcomes.push(outcome);
        }

        let report = CycleReport::new(outcomes);
        let still_pending = report.outcomes.len() - report.total_assigned;
        self.metrics.pending_deliveries.set(still_pending as i64);
        self.metrics
            .dispatch_cycle_seconds
            .observe(start.elapsed().as_secs_f64());

        if report.total_assigned > 0 {
            let assigned: Vec<String> = report
                .outcomes
                .iter()
                .filter(|o| o.is_assigned())
                .map(|o| o.delivery_id().to_string())
                .collect();
            self.record(
                ActivityKind::AssignedDelivery,
                format!(
                    "Assigned {} deliveries: {}",
                    report.total_assigned,
                    assigned.join(", ")
                ),
            )
            .await;
        }

        info!(
            processed = report.outcomes.len(),
            assigned = report.total_assigned,
            pending = still_pending,
            "dispatch cycle finished"
        );

        Ok(report)
    }

    async fn process_delivery(&self, index: &GeofenceIndex, delivery: Delivery) -> DispatchOutcome {
        let delivery_id = delivery.id;

        let zone = index
            .is_excluded(&delivery.pickup)
            .or_else(|| index.is_excluded(&delivery.dropoff));
        if let Some(zone) = zone {
            warn!(%delivery_id, zone, "delivery inside geofence, skipped");
            self.record(
                ActivityKind::GeofenceViolation,
                format!("Delivery {delivery_id} inside geofence {zone}, skipped"),
            )
            .await;
            return DispatchOutcome::SkippedGeofence {
                delivery_id,
                zone: zone.to_string(),
            };
        }

        let mut retries = 0;
        loop {
            match self.try_assign(&delivery).await {
                Ok(assignment) => {
                    info!(
                        %delivery_id,
                        driver_id = %assignment.driver_id,
                        eta_minutes = assignment.eta_minutes,
                        "delivery assigned"
                    );
                    self.record(
                        ActivityKind::AssignDriver,
                        format!(
                            "Assigned delivery {delivery_id} to driver {}",
                            assignment.driver_name
                        ),
                    )
                    .await;
                    let _ = self.events_tx.send(assignment.clone());
                    return DispatchOutcome::Assigned(assignment);
                }
                Err(DispatchError::NoAvailableDriver) => {
                    warn!(%delivery_id, "no available driver");
                    self.record(
                        ActivityKind::AssignmentFailed,
                        format!("No available driver for delivery {delivery_id}"),
                    )
                    .await;
                    return DispatchOutcome::SkippedNoDriver { delivery_id };
                }
                Err(DispatchError::Route(err)) => {
                    warn!(%delivery_id, error = %err, "route computation failed");
                    self.record(
                        ActivityKind::RouteError,
                        format!("Route request failed for delivery {delivery_id}: {err}"),
                    )
                    .await;
                    return DispatchOutcome::SkippedRouteError {
                        delivery_id,
                        reason: err.to_string(),
                    };
                }
                Err(DispatchError::Store(StoreError::Conflict(msg))) => {
                    let still_pending = matches!(
                        self.store.get_delivery(delivery_id).await,
                        Ok(current) if current.is_awaiting_assignment()
                    );
                    if still_pending && retries < self.settings.commit_retries {
                        retries += 1;
                        warn!(%delivery_id, retries, "assignment commit conflicted, retrying");
                        continue;
                    }

                    warn!(%delivery_id, reason = %msg, "assignment commit conflicted");
                    self.record(
                        ActivityKind::AssignmentConflict,
                        format!("Assignment of delivery {delivery_id} conflicted: {msg}"),
                    )
                    .await;
                    return DispatchOutcome::SkippedConflict { delivery_id };
                }
                Err(DispatchError::Store(err)) => {
                    error!(%delivery_id, error = %err, "store failure while assigning");
                    return DispatchOutcome::Failed {
                        delivery_id,
                        reason: err.to_string(),
                    };
                }
            }
        }
    }

    /// Reserves a driver, routes, and commits. Any failure after the
    /// reservation releases the driver again.
    async fn try_assign(&self, delivery: &Delivery) -> Result<Assignment, DispatchError> {
        let driver = self.pool.select_best_driver(&delivery.pickup).await?;
        self.observe_driver_load(&driver);

        match self.route_and_commit(delivery, &driver).await {
            Ok(assignment) => Ok(assignment),
            Err(err) => {
                match self.pool.release(driver.id).await {
                    Ok(released) => self.observe_driver_load(&released),
                    Err(release_err) => error!(
                        driver_id = %driver.id,
                        error = %release_err,
                        "failed to release driver after aborted assignment"
                    ),
                }
                Err(err)
            }
        }
    }

    async fn route_and_commit(
        &self,
        delivery: &Delivery,
        driver: &Driver,
    ) -> Result<Assignment, DispatchError> {
        let to_pickup = self.route_leg(driver.location, delivery.pickup).await?;
        let to_dropoff = self.route_leg(delivery.pickup, delivery.dropoff).await?;
        let route = Route::compose(delivery.id, &to_pickup, &to_dropoff);

        let now = Utc::now();
        let eta = self.eta_estimator().await;
        let model_eta_minutes = eta.estimate_minutes(&driver.location, &delivery.pickup, now)
            + eta.estimate_minutes(&delivery.pickup, &delivery.dropoff, now);

        let assignment = Assignment {
            delivery_id: delivery.id,
            driver_id: driver.id,
            driver_name: driver.name.clone(),
            pickup: delivery.pickup,
            dropoff: delivery.dropoff,
            eta_minutes: route.duration_minutes,
            model_eta_minutes,
            distance_km: route.distance_km,
            route_coordinates: route.waypoints.clone(),
        };

        self.store
            .commit_assignment(AssignmentCommit {
                delivery_id: delivery.id,
                driver_id: driver.id,
                eta_minutes: route.duration_minutes,
                route,
            })
            .await?;

        Ok(assignment)
    }

    async fn route_leg(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Result<RouteLeg, RouteError> {
        let start = Instant::now();
        let limit = self.settings.routing_timeout;

        let result = match timeout(limit, self.router.compute_route(origin, destination)).await {
            Ok(result) => result,
            Err(_) => Err(RouteError::Timeout(limit.as_millis() as u64)),
        };

        let label = if result.is_ok() { "success" } else { "error" };
        self.metrics
            .routing_latency_seconds
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    fn observe_driver_load(&self, driver: &Driver) {
        self.metrics
            .driver_load
            .with_label_values(&[&driver.id.to_string()])
            .set(driver.current_load as f64);
    }

    async fn record(&self, kind: ActivityKind, details: String) {
        if let Err(err) = self
            .store
            .append_activity(ActivityLogEntry::new(kind, details))
            .await
        {
            warn!(error = %err, activity = ?kind, "failed to write activity log");
        }
    }
}

/// Runs a dispatch cycle every `interval` until the task is dropped.
pub async fn run_dispatch_loop(engine: Arc<DispatchEngine>, interval: Duration) {
    info!(interval_secs = interval.as_secs(), "dispatch loop started");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(err) = engine.run_assignment_cycle().await {
            error!(error = %err, "dispatch cycle failed");
        }
    }
}
