use std::fs;
use std::path::PathBuf;

use step_led_plugin::metadata::PluginProperties;
use step_led_plugin::release::{archive_members, ReleaseBuilder};

fn plugin_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/lib.rs"), "// lib\n").unwrap();
    fs::write(dir.path().join("src/plugin.rs"), "// plugin\n").unwrap();
    dir
}

#[test]
fn archive_member_list_is_exact() {
    let source = plugin_fixture();
    let output = tempfile::tempdir().unwrap();

    let builder = ReleaseBuilder::new(
        source.path(),
        PluginProperties::current("1.0.0".to_string()),
    )
    .with_output_dir(output.path());

    let archive = builder.build().unwrap();
    assert_eq!(
        archive.file_name().and_then(|n| n.to_str()),
        Some("test_plugin-1.0.0.tar.gz")
    );

    assert_eq!(
        archive_members(&archive).unwrap(),
        vec![
            PathBuf::from("Cargo.toml"),
            PathBuf::from("src/lib.rs"),
            PathBuf::from("src/plugin.rs"),
            PathBuf::from("properties.yml"),
        ]
    );
}

#[test]
fn archive_includes_optional_hooks_and_requirements() {
    let source = plugin_fixture();
    fs::create_dir(source.path().join("hooks")).unwrap();
    fs::write(source.path().join("hooks/on_install.sh"), "#!/bin/sh\n").unwrap();
    fs::write(source.path().join("requirements.txt"), "host >= 1.0\n").unwrap();
    let output = tempfile::tempdir().unwrap();

    let builder = ReleaseBuilder::new(
        source.path(),
        PluginProperties::current("1.0.0".to_string()),
    )
    .with_output_dir(output.path());

    let archive = builder.build().unwrap();
    assert_eq!(
        archive_members(&archive).unwrap(),
        vec![
            PathBuf::from("Cargo.toml"),
            PathBuf::from("src/lib.rs"),
            PathBuf::from("src/plugin.rs"),
            PathBuf::from("properties.yml"),
            PathBuf::from("hooks/on_install.sh"),
            PathBuf::from("requirements.txt"),
        ]
    );
}

#[test]
fn generated_properties_carry_the_plugin_identity() {
    let source = plugin_fixture();
    let builder = ReleaseBuilder::new(
        source.path(),
        PluginProperties::current("2.1.0".to_string()),
    );
    builder.build().unwrap();

    let properties = PluginProperties::load(&source.path().join("properties.yml")).unwrap();
    assert_eq!(properties.plugin_name, "wheelerlab.test_plugin");
    assert_eq!(properties.package_name, "test_plugin");
    assert_eq!(properties.version, "2.1.0");
}
