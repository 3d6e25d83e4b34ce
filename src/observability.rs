use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: reservations successfully created.
pub const RESERVATIONS_CREATED_TOTAL: &str = "labslot_reservations_created_total";

/// Counter: bookings rejected by the conflict check.
pub const RESERVATION_CONFLICTS_TOTAL: &str = "labslot_reservation_conflicts_total";

/// Counter: reservations cancelled.
pub const RESERVATIONS_CANCELLED_TOTAL: &str = "labslot_reservations_cancelled_total";

/// Counter: template notifications handed to the sender.
pub const NOTIFICATIONS_SENT_TOTAL: &str = "labslot_notifications_sent_total";

/// Counter: rejected login attempts.
pub const AUTH_FAILURES_TOTAL: &str = "labslot_auth_failures_total";

/// Install the Prometheus metrics exporter on the given port. No-op if port
/// is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Default tracing subscriber for embedding binaries and examples.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}
