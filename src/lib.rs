//! MicroDrop step LED plugin.
//!
//! A plugin for a digital-microfluidics protocol runner. It declares two
//! configuration surfaces (an application-level serial port selection and a
//! per-protocol-step `led_on` flag) and mirrors the per-step flag to
//! digital pin 13 of a microcontroller reached over a serial link.
//!
//! The host runtime drives everything: it enables and disables the plugin,
//! signals step execution, and persists the configuration values. The plugin
//! sees the host only through the [`host::HostContext`] capability trait and
//! answers each step with a single [`host::HostSignal::StepComplete`].
//!
//! # Architecture
//!
//! ```text
//! Host Runtime ──lifecycle/step callbacks──> StepPinController
//!      ^                                          │
//!      └──────── StepComplete signal ─────────────┤
//!                                                 v
//!                                     PinProxy (serial link, pin 13)
//! ```
//!
//! The `release` binary packages the plugin sources and generated
//! `properties.yml` metadata into a versioned tarball for distribution.

pub mod error;
pub mod host;
pub mod metadata;
pub mod plugin;
pub mod ports;
pub mod proxy;
pub mod release;
pub mod schema;
#[cfg(feature = "serial")]
pub mod serial_proxy;
pub mod settings;

pub use error::{PluginError, ProxyError};
pub use host::{HostContext, HostSignal, MockHost, PluginId};
pub use plugin::StepPinController;
pub use proxy::{MockConnector, MockPinProxy, PinMode, PinProxy, PinProxyConnector, LED_PIN};
#[cfg(feature = "serial")]
pub use serial_proxy::{SerialConnector, SerialPinProxy};
pub use settings::{AppSettings, MemoryStore, SettingsStore, StepSettings};

/// Identity under which the host registers this plugin.
pub const PLUGIN_NAME: &str = "wheelerlab.test_plugin";

/// Package name used for release archives.
pub const PACKAGE_NAME: &str = "test_plugin";
