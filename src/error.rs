//! Custom error types for the plugin.
//!
//! Two error enums cover the plugin's failure surface:
//!
//! - **`ProxyError`**: everything that can go wrong talking to the pin
//!   device: a missing port configuration, a failed open, transport I/O, an
//!   unexpected reply, or serial support compiled out.
//! - **`PluginError`**: the aggregate error type for the library's fallible
//!   entry points (metadata handling, settings loading, archive building),
//!   with `#[from]` conversions so `?` composes across the crate.
//!
//! Connection and write failures inside the lifecycle callbacks are not
//! propagated: the controller catches them, logs at error level, and carries
//! on. A missing device must never block the host.

use thiserror::Error;

/// Errors from the pin-proxy device boundary.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("No serial port configured")]
    NoPortConfigured,

    #[cfg(feature = "serial")]
    #[error("Failed to open serial port '{port}': {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("I/O error talking to pin device: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for reply from '{port}'")]
    Timeout { port: String },

    #[error("Unexpected reply from pin device: expected '{expected}', got '{got}'")]
    Protocol { expected: String, got: String },

    #[error("Serial support not enabled. Rebuild with --features serial")]
    SerialFeatureDisabled,
}

/// Aggregate error type for the plugin library.
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin metadata error: {0}")]
    Metadata(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
