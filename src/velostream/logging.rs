//! Logger initialization
//!
//! Library code logs through the `log` facade only. Binaries and tests call
//! [`init_logging`] to install `env_logger`; `RUST_LOG` overrides the default filter.

use env_logger::Env;

/// Install the global logger; later calls are no-ops
pub fn init_logging() {
    init_logging_with_default("info");
}

pub fn init_logging_with_default(default_filter: &str) {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}
