//! Release archive builder.
//!
//! Packages the plugin for distribution as `{package}-{version}.tar.gz`.
//! The archive contains the plugin manifest and sources, the generated
//! `properties.yml`, and, when present, the installation `hooks/` directory
//! and `requirements.txt`. Member order is deterministic so the contents can
//! be asserted exactly.

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::error::PluginError;
use crate::metadata::PluginProperties;

const PROPERTIES_FILE: &str = "properties.yml";
const HOOKS_DIR: &str = "hooks";
const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Builds the distributable plugin archive for one source tree.
pub struct ReleaseBuilder {
    source_dir: PathBuf,
    output_dir: PathBuf,
    properties: PluginProperties,
}

impl ReleaseBuilder {
    /// Creates a builder for the plugin at `source_dir`. The archive is
    /// written into the source directory unless overridden.
    pub fn new(source_dir: impl Into<PathBuf>, properties: PluginProperties) -> Self {
        let source_dir = source_dir.into();
        Self {
            output_dir: source_dir.clone(),
            source_dir,
            properties,
        }
    }

    /// Set the directory the archive is written to
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// File name of the archive this builder produces.
    pub fn archive_name(&self) -> String {
        format!(
            "{}-{}.tar.gz",
            self.properties.package_name, self.properties.version
        )
    }

    /// Archive members for the current source tree, in archive order:
    /// `Cargo.toml`, the sources under `src/`, `properties.yml`, then the
    /// optional `hooks/` contents and `requirements.txt` when present.
    pub fn members(&self) -> Result<Vec<PathBuf>, PluginError> {
        let mut members = vec![PathBuf::from("Cargo.toml")];
        members.extend(collect_files(&self.source_dir, Path::new("src"))?);
        members.push(PathBuf::from(PROPERTIES_FILE));
        if self.source_dir.join(HOOKS_DIR).is_dir() {
            members.extend(collect_files(&self.source_dir, Path::new(HOOKS_DIR))?);
        }
        if self.source_dir.join(REQUIREMENTS_FILE).is_file() {
            members.push(PathBuf::from(REQUIREMENTS_FILE));
        }
        Ok(members)
    }

    /// Writes `properties.yml` into the source tree and builds the archive.
    /// Returns the path of the written archive.
    pub fn build(&self) -> Result<PathBuf, PluginError> {
        let properties_path = self.source_dir.join(PROPERTIES_FILE);
        fs::write(&properties_path, self.properties.to_yaml()?)?;
        debug!("Wrote {}", properties_path.display());

        let archive_path = self.output_dir.join(self.archive_name());
        let file = fs::File::create(&archive_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for member in self.members()? {
            builder.append_path_with_name(self.source_dir.join(&member), &member)?;
        }

        builder.into_inner()?.finish()?;
        info!(
            "Packaged {} {} into {}",
            self.properties.plugin_name,
            self.properties.version,
            archive_path.display()
        );
        Ok(archive_path)
    }
}

/// Member paths inside an existing archive, in order.
pub fn archive_members(path: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let file = fs::File::open(path)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut members = Vec::new();
    for entry in archive.entries()? {
        members.push(entry?.path()?.into_owned());
    }
    Ok(members)
}

/// Files under `source_dir/subdir`, recursively, as paths relative to
/// `source_dir`, sorted.
fn collect_files(source_dir: &Path, subdir: &Path) -> Result<Vec<PathBuf>, PluginError> {
    let mut files = Vec::new();
    let mut pending = vec![source_dir.join(subdir)];

    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if let Ok(relative) = path.strip_prefix(source_dir) {
                files.push(relative.to_path_buf());
            }
        }
    }

    files.sort();
    Ok(files)
}
