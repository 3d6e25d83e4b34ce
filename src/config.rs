//! Environment-driven configuration for embedding binaries.

use crate::auth::AuthConfig;

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// Build an [`AuthConfig`] from `LABSLOT_*` environment variables, falling
/// back to the defaults for anything unset.
pub fn auth_from_env() -> AuthConfig {
    let base = AuthConfig::default();
    AuthConfig {
        secret: std::env::var("LABSLOT_SECRET").unwrap_or(base.secret),
        session_ttl_hours: env_parse("LABSLOT_SESSION_TTL_HOURS").unwrap_or(base.session_ttl_hours),
        setup_ttl_hours: env_parse("LABSLOT_SETUP_TTL_HOURS").unwrap_or(base.setup_ttl_hours),
        clock_skew_secs: env_parse("LABSLOT_CLOCK_SKEW_SECS").unwrap_or(base.clock_skew_secs),
        setup_link_base: std::env::var("LABSLOT_SETUP_LINK_BASE").unwrap_or(base.setup_link_base),
    }
}

/// Port for the Prometheus exporter, if metrics are enabled.
pub fn metrics_port_from_env() -> Option<u16> {
    env_parse("LABSLOT_METRICS_PORT")
}
