//! Plugin release tool.
//!
//! Writes `properties.yml` with the plugin identity and a git-derived
//! version, then packages the source tree into
//! `{package}-{version}.tar.gz`.
//!
//! # Usage
//!
//! ```bash
//! release                            # package the current directory
//! release --version 1.2.0           # override the git-derived version
//! release --output-dir dist/        # write the archive elsewhere
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use step_led_plugin::metadata::{version_from_git, PluginProperties};
use step_led_plugin::release::ReleaseBuilder;

#[derive(Parser)]
#[command(name = "release")]
#[command(about = "Package the plugin into a versioned tar.gz archive", long_about = None)]
struct Cli {
    /// Plugin source directory
    #[arg(long, default_value = ".")]
    source_dir: PathBuf,

    /// Directory the archive is written to (defaults to the source directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Version override; defaults to the git revision of the source directory
    #[arg(long)]
    version: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let version = cli
        .version
        .unwrap_or_else(|| version_from_git(&cli.source_dir));
    let properties = PluginProperties::current(version);

    let mut builder = ReleaseBuilder::new(&cli.source_dir, properties);
    if let Some(output_dir) = cli.output_dir {
        builder = builder.with_output_dir(output_dir);
    }

    let archive = builder.build().context("Failed to build plugin archive")?;
    println!("{}", archive.display());
    Ok(())
}
