//! Tracing setup for binaries and scripts embedding the crate.

use tracing_subscriber::EnvFilter;

/// Installs a formatted tracing subscriber with an env-controlled filter
/// and bridges `log` macros into it. Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    if tracing_log::LogTracer::init().is_err() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
