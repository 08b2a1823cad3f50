//! Pin proxy boundary: remote digital I/O over a serial link.
//!
//! [`PinProxy`] is the connected device handle; [`PinProxyConnector`] opens
//! one. The controller owns at most one live proxy at a time and drops it on
//! disable. [`MockPinProxy`] and [`MockConnector`] provide hardware-free
//! implementations with call logging and failure injection for tests.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ProxyError;

/// The digital output the step flag is written to.
pub const LED_PIN: u8 = 13;

/// Direction of a digital pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

impl fmt::Display for PinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinMode::Input => write!(f, "IN"),
            PinMode::Output => write!(f, "OUT"),
        }
    }
}

/// A live connection to the microcontroller's digital I/O.
pub trait PinProxy: Send {
    /// Identity string reported by the device at connect time.
    fn device_id(&self) -> &str;

    /// Port the connection was opened on.
    fn port_name(&self) -> &str;

    /// Configures the direction of a pin.
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), ProxyError>;

    /// Drives a digital pin high or low.
    fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), ProxyError>;
}

/// Opens pin-proxy connections.
///
/// Production code uses the serial-backed connector; tests inject
/// [`MockConnector`].
pub trait PinProxyConnector: Send {
    /// Opens a connection on `port`.
    fn connect(&self, port: &str) -> Result<Box<dyn PinProxy>, ProxyError>;
}

/// Connector compiled in when serial support is disabled; every connect
/// fails with [`ProxyError::SerialFeatureDisabled`].
#[cfg(not(feature = "serial"))]
pub(crate) struct UnavailableConnector;

#[cfg(not(feature = "serial"))]
impl PinProxyConnector for UnavailableConnector {
    fn connect(&self, _port: &str) -> Result<Box<dyn PinProxy>, ProxyError> {
        Err(ProxyError::SerialFeatureDisabled)
    }
}

#[derive(Default)]
struct MockPinState {
    fail_next_mode: AtomicBool,
    fail_next_write: AtomicBool,
    mode_log: Mutex<Vec<(u8, PinMode)>>,
    write_log: Mutex<Vec<(u8, bool)>>,
}

/// Pin proxy double for tests.
///
/// Clones share state, so a test can keep one handle for verification while
/// the controller owns the boxed other.
#[derive(Clone, Default)]
pub struct MockPinProxy {
    state: Arc<MockPinState>,
}

impl MockPinProxy {
    /// Creates a proxy that accepts every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `set_pin_mode` call fail.
    pub fn trigger_mode_failure(&self) {
        self.state.fail_next_mode.store(true, Ordering::SeqCst);
    }

    /// Makes the next `digital_write` call fail.
    pub fn trigger_write_failure(&self) {
        self.state.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Copy of the `(pin, mode)` calls seen so far.
    pub fn mode_log(&self) -> Vec<(u8, PinMode)> {
        self.state.mode_log.lock().unwrap().clone()
    }

    /// Copy of the `(pin, value)` writes seen so far.
    pub fn write_log(&self) -> Vec<(u8, bool)> {
        self.state.write_log.lock().unwrap().clone()
    }
}

impl PinProxy for MockPinProxy {
    fn device_id(&self) -> &str {
        "Mock pin device v1.0"
    }

    fn port_name(&self) -> &str {
        "mock"
    }

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), ProxyError> {
        if self.state.fail_next_mode.swap(false, Ordering::SeqCst) {
            return Err(ProxyError::Protocol {
                expected: "OK".to_string(),
                got: "ERR mock mode failure".to_string(),
            });
        }
        self.state.mode_log.lock().unwrap().push((pin, mode));
        Ok(())
    }

    fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), ProxyError> {
        if self.state.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(ProxyError::Protocol {
                expected: "OK".to_string(),
                got: "ERR mock write failure".to_string(),
            });
        }
        self.state.write_log.lock().unwrap().push((pin, value));
        Ok(())
    }
}

#[derive(Default)]
struct MockConnectorState {
    proxy: MockPinProxy,
    fail_next_connect: AtomicBool,
    connect_log: Mutex<Vec<String>>,
}

/// Connector double for tests. Every successful `connect` hands out a clone
/// of the same underlying [`MockPinProxy`].
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<MockConnectorState>,
}

impl MockConnector {
    /// Creates a connector whose connections always succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `connect` call fail.
    pub fn trigger_connect_failure(&self) {
        self.state.fail_next_connect.store(true, Ordering::SeqCst);
    }

    /// Handle to the shared proxy handed out by `connect`.
    pub fn proxy(&self) -> MockPinProxy {
        self.state.proxy.clone()
    }

    /// Ports `connect` has been asked for so far.
    pub fn connect_log(&self) -> Vec<String> {
        self.state.connect_log.lock().unwrap().clone()
    }
}

impl PinProxyConnector for MockConnector {
    fn connect(&self, port: &str) -> Result<Box<dyn PinProxy>, ProxyError> {
        self.state.connect_log.lock().unwrap().push(port.to_string());
        if self.state.fail_next_connect.swap(false, Ordering::SeqCst) {
            return Err(ProxyError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "mock connect failure",
            )));
        }
        Ok(Box::new(self.state.proxy.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_proxy_logs_calls_through_clones() {
        let proxy = MockPinProxy::new();
        let mut boxed: Box<dyn PinProxy> = Box::new(proxy.clone());

        boxed.set_pin_mode(LED_PIN, PinMode::Output).unwrap();
        boxed.digital_write(LED_PIN, true).unwrap();

        assert_eq!(proxy.mode_log(), vec![(LED_PIN, PinMode::Output)]);
        assert_eq!(proxy.write_log(), vec![(LED_PIN, true)]);
    }

    #[test]
    fn write_failure_is_one_shot() {
        let proxy = MockPinProxy::new();
        let mut boxed: Box<dyn PinProxy> = Box::new(proxy.clone());

        proxy.trigger_write_failure();
        assert!(boxed.digital_write(LED_PIN, true).is_err());
        assert!(boxed.digital_write(LED_PIN, true).is_ok());
        assert_eq!(proxy.write_log(), vec![(LED_PIN, true)]);
    }

    #[test]
    fn connector_records_requested_ports() {
        let connector = MockConnector::new();
        connector.connect("COM1").unwrap();
        connector.trigger_connect_failure();
        assert!(connector.connect("COM2").is_err());
        assert_eq!(connector.connect_log(), vec!["COM1", "COM2"]);
    }
}
