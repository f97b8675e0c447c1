//! Global subscriber installation.

pub mod spans;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use warden_core::config::ObservabilityConfig;
use warden_core::errors::{WardenError, WardenResult};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when set. Fails if a global
/// subscriber is already installed.
pub fn init_tracing(config: &ObservabilityConfig) -> WardenResult<()> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json_logs {
        registry.with(fmt::layer().json().with_target(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.map_err(|e| WardenError::ConfigError(format!("tracing init failed: {e}")))
}

/// The filter `init_tracing` would install.
pub fn build_filter(config: &ObservabilityConfig) -> WardenResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            WardenError::ConfigError(format!("invalid log level {:?}: {e}", config.log_level))
        }),
    }
}
