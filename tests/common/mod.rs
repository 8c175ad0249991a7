//! Shared fixtures for the integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const HOTPATH_DEP: &str = r#"hotpath = { version = "0.7", optional = true }"#;

pub const HOTPATH_BLOCK: &str = r#"hotpath = ["dep:hotpath", "hotpath/hotpath"]
hotpath-alloc = ["hotpath/hotpath-alloc"]

hotpath-off = ["hotpath/hotpath-off"]
"#;

pub const CHANNELS_DEP: &str =
    r#"channels-console = { version = "0.2", optional = true, features=['tokio', 'futures'] }"#;

/// Writes `crates/<name>/Cargo.toml` under `root`.
#[allow(unused)]
pub fn write_crate(root: &Path, name: &str, manifest: &str) {
    let dir = root.join("crates").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Cargo.toml"), manifest).unwrap();
}

/// Reads `crates/<name>/Cargo.toml` under `root`.
#[allow(unused)]
pub fn read_crate(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join("crates").join(name).join("Cargo.toml")).unwrap()
}

/// Helper to create a workspace with three crates
#[allow(unused)]
pub fn create_test_workspace() -> TempDir {
    let temp = TempDir::new().unwrap();

    fs::write(
        temp.path().join("Cargo.toml"),
        "[workspace]\nmembers = [\"crates/*\"]\nresolver = \"2\"\n",
    )
    .unwrap();

    write_crate(
        temp.path(),
        "core",
        r#"[package]
name = "core"
version = "0.1.0"
edition = "2021"

[dependencies]
serde = "1"
[dev-dependencies]
tempfile = "3"
"#,
    );

    write_crate(
        temp.path(),
        "api",
        r#"[package]
name = "api"
version = "0.1.0"
edition = "2021"

[features]
default = []

[dependencies]
core = { path = "../core" }
"#,
    );

    write_crate(
        temp.path(),
        "macros",
        r#"[package]
name = "macros"
version = "0.1.0"
edition = "2021"

[lib]
proc-macro = true
"#,
    );

    temp
}

/// Helper to run an inject command from `root`
pub fn run_inject(root: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("cargo-inject");
    cmd.arg("inject")
        .args(args)
        .env("NO_COLOR", "1")
        .current_dir(root);

    cmd.assert()
}
