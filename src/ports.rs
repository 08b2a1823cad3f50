//! Serial port enumeration for the configuration schema.
//!
//! Queried once at plugin-load time; the resulting names populate the
//! `serial_port` choice list and its default.

#[cfg(feature = "serial")]
use log::warn;

/// Names of the serial ports currently present on the system, sorted for a
/// stable default. Enumeration failure is logged and reported as an empty
/// list.
#[cfg(feature = "serial")]
pub fn available_port_names() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => {
            let mut names: Vec<String> = ports.into_iter().map(|p| p.port_name).collect();
            names.sort();
            names
        }
        Err(err) => {
            warn!("Failed to enumerate serial ports: {}", err);
            Vec::new()
        }
    }
}

/// Without serial support there are no ports to offer.
#[cfg(not(feature = "serial"))]
pub fn available_port_names() -> Vec<String> {
    Vec::new()
}
