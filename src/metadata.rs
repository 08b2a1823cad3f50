//! Plugin identity metadata.
//!
//! The host's plugin manager identifies an installed plugin by the
//! `properties.yml` file shipped inside its archive. The release tool
//! generates that file here, deriving the version string from the
//! source-control revision.

use std::path::Path;
use std::process::Command;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PluginError;
use crate::{PACKAGE_NAME, PLUGIN_NAME};

/// Contents of `properties.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginProperties {
    /// Registered plugin identity, e.g. `wheelerlab.test_plugin`.
    pub plugin_name: String,

    /// Package name used for the archive file name.
    pub package_name: String,

    /// Version string, normally derived from the git revision.
    pub version: String,
}

impl PluginProperties {
    /// Properties for this plugin at the given version.
    pub fn current(version: String) -> Self {
        Self {
            plugin_name: PLUGIN_NAME.to_string(),
            package_name: PACKAGE_NAME.to_string(),
            version,
        }
    }

    /// Serializes to the YAML document stored as `properties.yml`.
    pub fn to_yaml(&self) -> Result<String, PluginError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parses a `properties.yml` document.
    pub fn from_yaml(content: &str) -> Result<Self, PluginError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Loads properties from a file.
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

/// Derives a version string from the source-control revision of `dir`.
///
/// Uses `git describe --tags --always --dirty`; when `dir` is not inside a
/// git checkout (or git is unavailable), falls back to the crate version.
pub fn version_from_git(dir: &Path) -> String {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .current_dir(dir)
        .output();

    match output {
        Ok(out) if out.status.success() => {
            String::from_utf8_lossy(&out.stdout).trim().to_string()
        }
        _ => {
            warn!(
                "Could not derive version from git in {}; using crate version",
                dir.display()
            );
            env!("CARGO_PKG_VERSION").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_round_trip_through_yaml() {
        let properties = PluginProperties::current("1.2.0".to_string());
        let yaml = properties.to_yaml().unwrap();
        assert!(yaml.contains("plugin_name: wheelerlab.test_plugin"));
        assert!(yaml.contains("package_name: test_plugin"));
        assert!(yaml.contains("version: 1.2.0"));
        assert_eq!(PluginProperties::from_yaml(&yaml).unwrap(), properties);
    }

    #[test]
    fn version_falls_back_outside_a_checkout() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(version_from_git(dir.path()), env!("CARGO_PKG_VERSION"));
    }
}
