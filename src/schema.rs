//! Declared configuration fields.
//!
//! The host renders these descriptors into its options dialog (application
//! scope) and its protocol step grid (step scope), and persists the values
//! in its own store. The plugin only declares the field set; it never owns
//! the widgets or the storage.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Value type of a declared configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// On/off flag rendered as a checkbox.
    Bool,
    /// One-of-N string choice rendered as a dropdown.
    Enum,
}

/// A single declared configuration field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigField {
    /// Field name, also the key under which the value is stored.
    pub name: String,

    /// Value type.
    pub field_type: FieldType,

    /// Default value, if the field has one.
    #[serde(default)]
    pub default: Option<Value>,

    /// Whether the host may leave the field unset.
    #[serde(default)]
    pub optional: bool,

    /// Valid choices for [`FieldType::Enum`] fields; empty otherwise.
    #[serde(default)]
    pub choices: Vec<String>,
}

impl ConfigField {
    /// Declares an optional boolean field.
    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            field_type: FieldType::Bool,
            default: Some(json!(default)),
            optional: true,
            choices: Vec::new(),
        }
    }

    /// Declares an optional enumerated field whose default is the first
    /// choice, or unset when there are no choices.
    pub fn enumeration(name: &str, choices: Vec<String>) -> Self {
        let default = choices.first().map(|choice| json!(choice));
        Self {
            name: name.to_string(),
            field_type: FieldType::Enum,
            default,
            optional: true,
            choices,
        }
    }
}

/// Application-scoped fields, built from the serial ports detected at
/// plugin-load time.
pub fn app_fields(ports: &[String]) -> Vec<ConfigField> {
    vec![ConfigField::enumeration("serial_port", ports.to_vec())]
}

/// Step-scoped fields.
pub fn step_fields() -> Vec<ConfigField> {
    vec![ConfigField::boolean("led_on", false)]
}

/// Default option map for a field set, used to seed fresh settings
/// instances. Fields without a default are left out of the map.
pub fn defaults(fields: &[ConfigField]) -> Value {
    let mut map = Map::new();
    for field in fields {
        if let Some(default) = &field.default {
            map.insert(field.name.clone(), default.clone());
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{AppSettings, StepSettings};

    #[test]
    fn serial_port_defaults_to_first_detected_port() {
        let fields = app_fields(&["COM1".to_string(), "COM2".to_string()]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "serial_port");
        assert_eq!(fields[0].field_type, FieldType::Enum);
        assert_eq!(fields[0].default, Some(json!("COM1")));
        assert_eq!(fields[0].choices, vec!["COM1", "COM2"]);
    }

    #[test]
    fn serial_port_has_no_default_without_detected_ports() {
        let fields = app_fields(&[]);
        assert_eq!(fields[0].default, None);
        assert!(fields[0].choices.is_empty());
    }

    #[test]
    fn led_on_defaults_to_false() {
        let fields = step_fields();
        assert_eq!(fields[0].name, "led_on");
        assert_eq!(fields[0].default, Some(json!(false)));
    }

    #[test]
    fn defaults_seed_typed_settings() {
        let app = defaults(&app_fields(&["COM1".to_string()]));
        assert_eq!(
            AppSettings::from_options(&app).serial_port,
            Some("COM1".to_string())
        );

        // No detected ports: the default map is empty and the typed settings
        // read back as unset.
        let app = defaults(&app_fields(&[]));
        assert_eq!(AppSettings::from_options(&app).serial_port, None);

        let step = defaults(&step_fields());
        assert!(!StepSettings::from_options(&step).led_on);
    }
}
