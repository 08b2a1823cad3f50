//! Serial-backed pin proxy.
//!
//! Speaks a line-oriented ASCII protocol to the microcontroller:
//!
//! - `ID?` → one line of device identity (read once at connect time)
//! - `PM <pin> IN|OUT` → `OK`
//! - `DW <pin> 0|1` → `OK`
//!
//! Commands are terminated with `\r\n`; replies are read up to `\n`. Any
//! reply other than `OK` to a command is a protocol failure.

use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use log::{debug, trace};
use serialport::SerialPort;

use crate::error::ProxyError;
use crate::proxy::{PinMode, PinProxy, PinProxyConnector};

const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Opens [`SerialPinProxy`] connections.
///
/// # Example
/// ```no_run
/// use step_led_plugin::proxy::PinProxyConnector;
/// use step_led_plugin::serial_proxy::SerialConnector;
///
/// let proxy = SerialConnector::new().connect("/dev/ttyUSB0");
/// ```
pub struct SerialConnector {
    baud_rate: u32,
    timeout: Duration,
}

impl SerialConnector {
    /// Creates a connector with the default baud rate (115200) and a one
    /// second reply timeout.
    pub fn new() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_secs(1),
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl PinProxyConnector for SerialConnector {
    fn connect(&self, port: &str) -> Result<Box<dyn PinProxy>, ProxyError> {
        let proxy = SerialPinProxy::open(port, self.baud_rate, self.timeout)?;
        Ok(Box::new(proxy))
    }
}

/// A pin proxy talking to the device over a serial port.
pub struct SerialPinProxy {
    port: Box<dyn SerialPort>,
    port_name: String,
    device_id: String,
    timeout: Duration,
}

impl SerialPinProxy {
    /// Opens `port_name` and performs the identity handshake.
    pub fn open(port_name: &str, baud_rate: u32, timeout: Duration) -> Result<Self, ProxyError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|source| ProxyError::Open {
                port: port_name.to_string(),
                source,
            })?;

        let mut proxy = Self {
            port,
            port_name: port_name.to_string(),
            device_id: String::new(),
            timeout,
        };

        let identity = proxy.send_command("ID?")?;
        if identity.is_empty() {
            return Err(ProxyError::Protocol {
                expected: "device identity".to_string(),
                got: "empty reply".to_string(),
            });
        }
        debug!("Device on {} identified as '{}'", port_name, identity);
        proxy.device_id = identity;
        Ok(proxy)
    }

    /// Sends one command line and reads one reply line.
    fn send_command(&mut self, command: &str) -> Result<String, ProxyError> {
        let line = format!("{}\r\n", command);
        trace!(
            "Sending to {}: '{}'",
            self.port_name,
            line.escape_default()
        );

        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;

        let mut reply = String::new();
        let mut buffer = [0u8; 1];
        let start = Instant::now();

        loop {
            if start.elapsed() > self.timeout {
                return Err(ProxyError::Timeout {
                    port: self.port_name.clone(),
                });
            }

            match self.port.read(&mut buffer) {
                Ok(1) => {
                    let ch = buffer[0] as char;
                    if ch == '\n' {
                        break;
                    }
                    reply.push(ch);
                }
                Ok(_) => {
                    return Err(ProxyError::Protocol {
                        expected: "reply line".to_string(),
                        got: "unexpected EOF".to_string(),
                    });
                }
                // The port timeout may be shorter than our overall timeout.
                Err(err) if err.kind() == ErrorKind::TimedOut => continue,
                Err(err) => return Err(err.into()),
            }
        }

        let reply = reply.trim().to_string();
        trace!("Received from {}: '{}'", self.port_name, reply);
        Ok(reply)
    }

    fn expect_ok(&mut self, command: &str) -> Result<(), ProxyError> {
        let reply = self.send_command(command)?;
        if reply == "OK" {
            Ok(())
        } else {
            Err(ProxyError::Protocol {
                expected: "OK".to_string(),
                got: reply,
            })
        }
    }
}

impl PinProxy for SerialPinProxy {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), ProxyError> {
        self.expect_ok(&format!("PM {} {}", pin, mode))
    }

    fn digital_write(&mut self, pin: u8, value: bool) -> Result<(), ProxyError> {
        self.expect_ok(&format!("DW {} {}", pin, u8::from(value)))
    }
}
