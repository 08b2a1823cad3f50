//! Application- and step-scoped plugin settings.
//!
//! The host's configuration store owns persistence; the plugin sees it only
//! through the [`SettingsStore`] boundary, keyed by plugin identity (and by
//! step index for step-scoped options). Stored values are JSON option maps;
//! the typed structs here deserialize from them, falling back to the schema
//! defaults for missing keys. Settings are read when needed, never cached.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use config::Config;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PluginError;
use crate::host::PluginId;

/// Application-scoped settings: one instance per installation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// Serial port the pin device is reached on. Must be one of the ports
    /// enumerated at plugin-load time, or absent.
    #[serde(default)]
    pub serial_port: Option<String>,
}

impl AppSettings {
    /// Reads the typed settings out of a stored option map.
    pub fn from_options(options: &Value) -> Self {
        Self {
            serial_port: options
                .get("serial_port")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Step-scoped settings: one instance per protocol step, independent of the
/// settings of every other step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepSettings {
    /// Whether the LED pin is driven high while this step executes.
    #[serde(default)]
    pub led_on: bool,
}

impl StepSettings {
    /// Reads the typed settings out of a stored option map.
    pub fn from_options(options: &Value) -> Self {
        Self {
            led_on: options
                .get("led_on")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// The host's settings persistence API, as seen by the plugin.
///
/// Exact storage format is owned by the host; values cross this boundary as
/// JSON option maps.
pub trait SettingsStore: Send + Sync {
    /// Application-scoped options for `plugin`, if any have been stored.
    fn app_options(&self, plugin: &PluginId) -> Option<Value>;

    /// Replaces the application-scoped options for `plugin`.
    fn set_app_options(&self, plugin: &PluginId, options: Value);

    /// Options stored for `plugin` on step `step`, if any.
    fn step_options(&self, plugin: &PluginId, step: usize) -> Option<Value>;

    /// Replaces the options for `plugin` on step `step`.
    fn set_step_options(&self, plugin: &PluginId, step: usize, options: Value);
}

/// In-memory settings store.
///
/// Backs [`MockHost`](crate::host::MockHost); also usable by any embedding
/// host that keeps plugin options in process.
#[derive(Default)]
pub struct MemoryStore {
    app: Mutex<HashMap<PluginId, Value>>,
    steps: Mutex<HashMap<(PluginId, usize), Value>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn app_options(&self, plugin: &PluginId) -> Option<Value> {
        self.app.lock().unwrap().get(plugin).cloned()
    }

    fn set_app_options(&self, plugin: &PluginId, options: Value) {
        self.app.lock().unwrap().insert(plugin.clone(), options);
    }

    fn step_options(&self, plugin: &PluginId, step: usize) -> Option<Value> {
        self.steps.lock().unwrap().get(&(plugin.clone(), step)).cloned()
    }

    fn set_step_options(&self, plugin: &PluginId, step: usize, options: Value) {
        self.steps
            .lock()
            .unwrap()
            .insert((plugin.clone(), step), options);
    }
}

/// Loads application-scoped options for `plugin` from a host-style TOML
/// config file.
///
/// The host keeps one table per plugin name, so a plugin registered as
/// `wheelerlab.test_plugin` reads from:
///
/// ```toml
/// [wheelerlab.test_plugin]
/// serial_port = "/dev/ttyUSB0"
/// ```
///
/// Returns `Ok(None)` when the file has no table for this plugin.
pub fn load_app_options(path: &Path, plugin: &PluginId) -> Result<Option<Value>, PluginError> {
    let cfg = Config::builder()
        .add_source(config::File::from(path.to_path_buf()))
        .build()?;

    match cfg.get::<Value>(plugin.as_str()) {
        Ok(options) => Ok(Some(options)),
        Err(config::ConfigError::NotFound(_)) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn app_settings_read_port_from_options() {
        let options = json!({ "serial_port": "COM3" });
        assert_eq!(
            AppSettings::from_options(&options),
            AppSettings {
                serial_port: Some("COM3".to_string())
            }
        );
    }

    #[test]
    fn app_settings_default_to_no_port() {
        assert_eq!(AppSettings::from_options(&json!({})).serial_port, None);
        // A null stored value reads the same as an absent key.
        assert_eq!(
            AppSettings::from_options(&json!({ "serial_port": null })).serial_port,
            None
        );
    }

    #[test]
    fn step_settings_default_led_off() {
        assert!(!StepSettings::from_options(&json!({})).led_on);
        assert!(StepSettings::from_options(&json!({ "led_on": true })).led_on);
    }

    #[test]
    fn memory_store_keeps_steps_independent() {
        let store = MemoryStore::new();
        let plugin = PluginId::new("wheelerlab.test_plugin");

        store.set_step_options(&plugin, 0, json!({ "led_on": true }));
        store.set_step_options(&plugin, 1, json!({ "led_on": false }));

        assert!(StepSettings::from_options(&store.step_options(&plugin, 0).unwrap()).led_on);
        assert!(!StepSettings::from_options(&store.step_options(&plugin, 1).unwrap()).led_on);
        assert!(store.step_options(&plugin, 2).is_none());
    }

    #[test]
    fn loads_app_options_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            "[wheelerlab.test_plugin]\nserial_port = \"/dev/ttyACM0\"\n",
        )
        .unwrap();

        let plugin = PluginId::new("wheelerlab.test_plugin");
        let options = load_app_options(&path, &plugin).unwrap().unwrap();
        assert_eq!(
            AppSettings::from_options(&options).serial_port,
            Some("/dev/ttyACM0".to_string())
        );

        let other = PluginId::new("wheelerlab.other_plugin");
        assert!(load_app_options(&path, &other).unwrap().is_none());
    }
}
