//! Resolution of options from a project on disk, layer by layer.

use std::fs;
use std::path::Path;

use karium_config::{
    BuildOptions, BuilderKind, ConfigDiscovery, ConfigError, ConfigLayer, default_layer,
    merge_layers,
};
use serde_json::json;
use tempfile::TempDir;

fn resolve(root: &Path, inline: ConfigLayer) -> Result<BuildOptions, ConfigError> {
    let discovery = ConfigDiscovery::new(root);
    let file = discovery.load_build_config()?;
    let pkg = discovery.load_manifest()?;
    let manifest = pkg.config_layer()?;

    let merged = merge_layers([file, manifest, inline, default_layer(&pkg, false)]);
    BuildOptions::from_layer(root, merged, &pkg)
}

#[test]
fn build_config_file_wins_over_manifest_and_inline() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("build.config.toml"),
        r#"
outDir = "out"
entries = ["src/index"]
"#,
    )
    .expect("write config");
    fs::write(
        dir.path().join("package.json"),
        json!({
            "name": "fixture",
            "buildkarium": { "outDir": "lib", "declaration": true, "entries": ["src/cli"] }
        })
        .to_string(),
    )
    .expect("write manifest");

    let inline = ConfigLayer::from_value(json!({
        "outDir": "inline",
        "clean": false,
        "entries": ["src/inline"]
    }))
    .expect("inline layer");

    let options = resolve(dir.path(), inline).expect("resolve");

    assert_eq!(options.name, "fixture");
    assert_eq!(options.out_dir, dir.path().join("out"));
    assert!(options.declaration);
    assert!(!options.clean);

    let inputs: Vec<_> = options.entries.iter().map(|e| e.input.clone()).collect();
    assert_eq!(
        inputs,
        vec![
            dir.path().join("src/index"),
            dir.path().join("src/cli"),
            dir.path().join("src/inline"),
        ]
    );
}

#[test]
fn entries_are_normalized_with_inferred_builders() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("build.config.json"),
        json!({
            "entries": [
                "src/index",
                { "input": "src/runtime/", "outDir": "dist/runtime" },
                { "input": "src/schema", "builder": "typegen" }
            ]
        })
        .to_string(),
    )
    .expect("write config");

    let options = resolve(dir.path(), ConfigLayer::default()).expect("resolve");
    let kinds: Vec<_> = options.entries.iter().map(|e| e.builder()).collect();
    assert_eq!(
        kinds,
        vec![BuilderKind::Bundle, BuilderKind::Mirror, BuilderKind::Typegen]
    );
    assert_eq!(options.entries[1].out_dir, dir.path().join("dist/runtime"));
    assert_eq!(options.entries[2].out_dir, dir.path().join("dist"));
    assert!(options.entries.iter().all(|e| e.input.is_absolute()));
}

#[test]
fn missing_input_fails_even_with_valid_siblings() {
    let dir = TempDir::new().expect("tempdir");
    let inline = ConfigLayer::from_value(json!({
        "entries": ["src/index", { "name": "broken" }, "src/other"]
    }))
    .expect("inline layer");

    let err = resolve(dir.path(), inline).unwrap_err();
    assert!(err.to_string().starts_with("Missing entry input:"));
    assert!(err.to_string().contains("broken"));
}

#[test]
fn array_fields_concatenate_in_precedence_order() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join("build.config.json"),
        json!({ "externals": ["from-file"] }).to_string(),
    )
    .expect("write config");
    let inline = ConfigLayer::from_value(json!({ "externals": ["from-inline"] })).expect("inline");

    let options = resolve(dir.path(), inline).expect("resolve");
    let names: Vec<_> = options.externals.iter().map(|e| e.to_string()).collect();

    assert_eq!(names[0], "from-file");
    assert_eq!(names[1], "from-inline");
    assert!(names.iter().any(|name| name == "node:path"));
}

#[test]
fn malformed_build_config_is_fatal() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(dir.path().join("build.config.toml"), "entries = [").expect("write config");

    assert!(matches!(
        resolve(dir.path(), ConfigLayer::default()),
        Err(ConfigError::Load(_))
    ));
}
