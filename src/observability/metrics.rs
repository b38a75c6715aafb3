use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dispatch_outcomes_total: IntCounterVec,
    pub dispatch_cycle_seconds: Histogram,
    pub routing_latency_seconds: HistogramVec,
    pub pending_deliveries: IntGauge,
    pub driver_load: GaugeVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dispatch_outcomes_total = IntCounterVec::new(
            Opts::new("dispatch_outcomes_total", "Per-delivery dispatch outcomes"),
            &["outcome"],
        )
        .expect("valid dispatch_outcomes_total metric");

        let dispatch_cycle_seconds = Histogram::with_opts(HistogramOpts::new(
            "dispatch_cycle_seconds",
            "Duration of a full dispatch cycle in seconds",
        ))
        .expect("valid dispatch_cycle_seconds metric");

        let routing_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "routing_latency_seconds",
                "Latency of routing provider calls in seconds",
            ),
            &["outcome"],
        )
        .expect("valid routing_latency_seconds metric");

        let pending_deliveries = IntGauge::new(
            "pending_deliveries",
            "Deliveries left pending after the last dispatch cycle",
        )
        .expect("valid pending_deliveries metric");

        let driver_load = GaugeVec::new(
            Opts::new("driver_load", "Active deliveries per driver"),
            &["driver_id"],
        )
        .expect("valid driver_load metric");

        registry
            .register(Box::new(dispatch_outcomes_total.clone()))
            .expect("register dispatch_outcomes_total");
        registry
            .register(Box::new(dispatch_cycle_seconds.clone()))
            .expect("register dispatch_cycle_seconds");
        registry
            .register(Box::new(routing_latency_seconds.clone()))
            .expect("register routing_latency_seconds");
        registry
            .register(Box::new(pending_deliveries.clone()))
            .expect("register pending_deliveries");
        registry
            .register(Box::new(driver_load.clone()))
            .expect("register driver_load");

        Self {
            registry,
            dispatch_outcomes_total,
            dispatch_cycle_seconds,
            routing_latency_seconds,
            pending_deliveries,
            driver_load,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
