use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub parcels_booked_total: IntCounter,
    pub status_updates_total: IntCounterVec,
    pub agent_assignments_total: IntCounter,
    pub location_updates_total: IntCounter,
    pub auth_attempts_total: IntCounterVec,
    pub ws_listeners: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let parcels_booked_total =
            IntCounter::new("parcels_booked_total", "Total parcels booked by customers")
                .expect("valid parcels_booked_total metric");

        let status_updates_total = IntCounterVec::new(
            Opts::new("status_updates_total", "Parcel status updates by target status"),
            &["status"],
        )
        .expect("valid status_updates_total metric");

        let agent_assignments_total = IntCounter::new(
            "agent_assignments_total",
            "Total agent assignments made by admins",
        )
        .expect("valid agent_assignments_total metric");

        let location_updates_total = IntCounter::new(
            "location_updates_total",
            "Total parcel location updates broadcast",
        )
        .expect("valid location_updates_total metric");

        let auth_attempts_total = IntCounterVec::new(
            Opts::new("auth_attempts_total", "Login and register attempts by outcome"),
            &["outcome"],
        )
        .expect("valid auth_attempts_total metric");

        let ws_listeners = IntGauge::new("ws_listeners", "Currently connected websocket listeners")
            .expect("valid ws_listeners metric");

        registry
            .register(Box::new(parcels_booked_total.clone()))
            .expect("register parcels_booked_total");
        registry
            .register(Box::new(status_updates_total.clone()))
            .expect("register status_updates_total");
        registry
            .register(Box::new(agent_assignments_total.clone()))
            .expect("register agent_assignments_total");
        registry
            .register(Box::new(location_updates_total.clone()))
            .expect("register location_updates_total");
        registry
            .register(Box::new(auth_attempts_total.clone()))
            .expect("register auth_attempts_total");
        registry
            .register(Box::new(ws_listeners.clone()))
            .expect("register ws_listeners");

        Self {
            registry,
            parcels_booked_total,
            status_updates_total,
            agent_assignments_total,
            location_updates_total,
            auth_attempts_total,
            ws_listeners,
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
