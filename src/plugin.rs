//! The step LED controller.
//!
//! Implements the plugin's lifecycle contract with the host: on enable it
//! opens a pin-proxy connection and configures the LED pin as an output; on
//! each step execution it mirrors the step's `led_on` flag to that pin; on
//! disable it releases the connection. Connection failures are caught and
//! logged: a missing device must not block the rest of the application from
//! enabling.

use std::sync::Arc;

use log::{debug, error, info};

use crate::host::{HostContext, HostSignal, PluginId};
use crate::proxy::{PinMode, PinProxy, PinProxyConnector, LED_PIN};
use crate::settings::{AppSettings, StepSettings};
use crate::{error::ProxyError, ports, schema, PLUGIN_NAME};

/// Plugin controller driven by the host's lifecycle and step callbacks.
///
/// State machine: `Disabled → on_plugin_enable → Enabled` with the proxy
/// either connected or absent; `on_plugin_disable` returns to `Disabled`.
/// Within `Enabled`, each `on_step_run` is stateless: it optionally performs
/// one pin write and always emits the step-completion signal.
pub struct StepPinController {
    id: PluginId,
    host: Arc<dyn HostContext>,
    connector: Box<dyn PinProxyConnector>,
    proxy: Option<Box<dyn PinProxy>>,
}

impl StepPinController {
    /// Creates the controller with the serial-backed connector.
    #[cfg(feature = "serial")]
    pub fn new(host: Arc<dyn HostContext>) -> Self {
        Self::with_connector(host, Box::new(crate::serial_proxy::SerialConnector::new()))
    }

    /// Without serial support every connect attempt fails (and is logged)
    /// at enable time; the plugin still participates in the step protocol.
    #[cfg(not(feature = "serial"))]
    pub fn new(host: Arc<dyn HostContext>) -> Self {
        Self::with_connector(host, Box::new(crate::proxy::UnavailableConnector))
    }

    /// Creates the controller with a custom connector (tests inject mocks
    /// here).
    pub fn with_connector(
        host: Arc<dyn HostContext>,
        connector: Box<dyn PinProxyConnector>,
    ) -> Self {
        Self {
            id: PluginId::new(PLUGIN_NAME),
            host,
            connector,
            proxy: None,
        }
    }

    /// The identity this plugin is registered under.
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Whether a pin-proxy connection is currently live.
    pub fn is_connected(&self) -> bool {
        self.proxy.is_some()
    }

    /// Host callback: the plugin was enabled.
    ///
    /// Attempts to open the pin proxy on the configured port and set the LED
    /// pin to output. On failure the error is logged and the plugin stays
    /// enabled without hardware control.
    pub fn on_plugin_enable(&mut self) {
        self.on_app_init();

        let settings = self
            .host
            .settings()
            .app_options(&self.id)
            .map(|options| AppSettings::from_options(&options))
            .unwrap_or_default();

        match self.open_proxy(&settings) {
            Ok(proxy) => {
                info!(
                    "Connected to '{}' on port {}",
                    proxy.device_id(),
                    proxy.port_name()
                );
                self.proxy = Some(proxy);
            }
            Err(err) => {
                error!(
                    "Could not connect pin proxy on port {}: {}",
                    settings.serial_port.as_deref().unwrap_or("<unset>"),
                    err
                );
                self.proxy = None;
            }
        }

        self.refresh_grid_if_loaded();
    }

    /// Host callback: the plugin was disabled.
    ///
    /// Releases the pin-proxy connection; safe to call when none is live.
    pub fn on_plugin_disable(&mut self) {
        if self.proxy.take().is_some() {
            debug!("Released pin proxy connection");
        }
        self.refresh_grid_if_loaded();
    }

    /// Host callback: the options of some plugin changed on `step_number`.
    ///
    /// Only acts when `plugin` is this plugin's own identity. Returns the
    /// step settings it logged, if any; the host ignores the return value.
    pub fn on_step_options_changed(
        &self,
        plugin: &PluginId,
        step_number: usize,
    ) -> Option<StepSettings> {
        if *plugin != self.id {
            return None;
        }
        let settings = self.step_settings(step_number);
        info!(
            "Step #{} options changed: led_on={}",
            step_number, settings.led_on
        );
        Some(settings)
    }

    /// Host callback: the current protocol step is executing.
    ///
    /// Writes the step's `led_on` flag to the LED pin when a proxy is
    /// connected and the host is in realtime mode or running a protocol.
    /// Always emits the step-completion signal, exactly once, even when the
    /// write fails: the host waits for it before sequencing the next step.
    pub fn on_step_run(&mut self) {
        if let Some(proxy) = self.proxy.as_mut() {
            if self.host.realtime_mode() || self.host.running() {
                let step = self.host.current_step();
                let settings = self
                    .host
                    .settings()
                    .step_options(&self.id, step)
                    .map(|options| StepSettings::from_options(&options))
                    .unwrap_or_default();

                if let Err(err) = proxy.digital_write(LED_PIN, settings.led_on) {
                    error!("Failed to write pin {} on step {}: {}", LED_PIN, step, err);
                }
            }
        }

        self.host.emit(HostSignal::StepComplete {
            plugin: self.id.clone(),
            result: None,
        });
    }

    /// Seeds the host store with the schema defaults the first time the
    /// plugin is enabled, so the configured port starts out as the first
    /// enumerated one.
    fn on_app_init(&self) {
        let store = self.host.settings();
        if store.app_options(&self.id).is_none() {
            let fields = schema::app_fields(&ports::available_port_names());
            store.set_app_options(&self.id, schema::defaults(&fields));
        }
    }

    fn open_proxy(&self, settings: &AppSettings) -> Result<Box<dyn PinProxy>, ProxyError> {
        let port = settings
            .serial_port
            .as_deref()
            .ok_or(ProxyError::NoPortConfigured)?;
        let mut proxy = self.connector.connect(port)?;
        // A connection whose pin cannot be configured counts as a failed
        // connect; the `?` drops it.
        proxy.set_pin_mode(LED_PIN, PinMode::Output)?;
        Ok(proxy)
    }

    fn step_settings(&self, step: usize) -> StepSettings {
        self.host
            .settings()
            .step_options(&self.id, step)
            .map(|options| StepSettings::from_options(&options))
            .unwrap_or_default()
    }
}
