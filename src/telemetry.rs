//! Opt-in logging setup.
//!
//! The crate emits `tracing` events at layout resolution and gesture
//! commit points but never installs a subscriber on its own. Hosts that
//! already carry a `tracing` stack wire their own subscriber and this
//! module stays out of the way; everyone else can enable the
//! `telemetry` feature and call [`init_default_tracing`] once at
//! startup.

/// Installs a compact stderr subscriber honoring `RUST_LOG`, falling
/// back to the `info` level when the variable is unset or malformed.
///
/// Returns whether the subscriber was installed. `false` means the
/// `telemetry` feature is off, or the host had already set a global
/// subscriber and this call left it in place.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        use tracing_subscriber::EnvFilter;

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        return tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
