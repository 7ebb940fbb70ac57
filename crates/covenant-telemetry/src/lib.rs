//! # Covenant Telemetry
//!
//! Logging setup shared by the covenant binaries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use covenant_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `COVENANT_SERVICE_NAME` | `covenant` | Service name in log records |
//! | `COVENANT_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `COVENANT_JSON_LOGS` | `false` | JSON formatted logs |
//! | `COVENANT_CONSOLE_OUTPUT` | `true` | Emit logs at all |

#![warn(missing_docs)]

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber was already installed.
    #[error("Failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Initialize logging for the process.
///
/// Call once, before the first log line.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "[covenant] Telemetry initialized"
    );
    Ok(())
}
