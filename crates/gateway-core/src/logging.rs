//! Logging initialization with a runtime-adjustable level.
//!
//! The admin surface can change the log level while the server runs, so the
//! env-filter layer is installed behind a reload handle.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Handle for adjusting the log level after initialization.
#[derive(Clone)]
pub struct LogHandle {
    reload: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replace the active filter; returns false if the directive is invalid
    /// or the subscriber has been torn down.
    pub fn set_level(&self, level: &str) -> bool {
        match EnvFilter::try_new(level) {
            Ok(filter) => self.reload.reload(filter).is_ok(),
            Err(_) => false,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// RUST_LOG takes precedence over the configured default. Returns a handle
/// for runtime level changes, or None if a subscriber was already installed
/// (tests initialize logging at most once per process).
pub fn init(default_level: &str) -> Option<LogHandle> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let (filter, handle) = reload::Layer::new(filter);

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    result.ok().map(|_| LogHandle { reload: handle })
}
