// 📝 Logging - tracing subscriber setup for the binaries
//
// Library code only emits `tracing` events; installing a subscriber is the
// binary's job.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `filter` (RUST_LOG syntax).
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
