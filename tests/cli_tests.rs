// ABOUTME: Integration tests for the command line binaries
// ABOUTME: Runs warden-cpi-install and render-template and checks output files and exit codes

use std::process::Command;

mod common;
use common::{TestEnvironment, TestReleaseBuilder};

const INSTALL_BIN: &str = env!("CARGO_BIN_EXE_warden-cpi-install");
const RENDER_BIN: &str = env!("CARGO_BIN_EXE_render-template");

fn install_command(env: &TestEnvironment) -> Command {
    let mut cmd = Command::new(INSTALL_BIN);
    cmd.env("WARDEN_CPI_INSTALL_ROOT", env.root.path())
        .env_remove("RUST_LOG")
        .current_dir(env.fixtures.path());
    cmd
}

#[test]
fn test_cli_help_command() {
    let output = Command::new(INSTALL_BIN)
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--prepare-only"));
    assert!(stdout.contains("ARCHIVE"));
}

#[test]
fn test_cli_version_command() {
    let output = Command::new(INSTALL_BIN)
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_install_with_config_file() {
    let env = TestEnvironment::new();
    let archive = TestReleaseBuilder::warden_cpi()
        .with_precompiled_package("warden_cpi")
        .build(env.fixtures.path());

    let config = env.fixtures.path().join("warden-cpi-install.yaml");
    std::fs::write(
        &config,
        "job_properties:\n  cpi.agent.mbus: nats://10.0.0.1:4222\n",
    )
    .unwrap();

    let output = install_command(&env)
        .arg("--no-color")
        .arg("--config")
        .arg(&config)
        .arg(&archive)
        .output()
        .expect("Failed to execute command");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Installed job warden_cpi"));
    assert!(env
        .read("jobs/warden_cpi/config/cpi.json")
        .contains("nats://10.0.0.1:4222"));
}

#[test]
fn test_cli_unresolved_property_exit_code() {
    let env = TestEnvironment::new();
    let archive = TestReleaseBuilder::warden_cpi()
        .with_precompiled_package("warden_cpi")
        .build(env.fixtures.path());

    let output = install_command(&env)
        .arg(&archive)
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cpi.agent.mbus"));
}

#[test]
fn test_cli_missing_archive_exit_code() {
    let env = TestEnvironment::new();
    let output = install_command(&env)
        .arg(env.fixtures.path().join("absent.tgz"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_invalid_config_exit_code() {
    let env = TestEnvironment::new();
    let config = env.fixtures.path().join("broken.yaml");
    std::fs::write(&config, "store_subdirs: {not: [valid").unwrap();

    let output = install_command(&env)
        .arg("--config")
        .arg(&config)
        .arg("--prepare-only")
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(8));
}

#[test]
fn test_cli_prepare_only() {
    let env = TestEnvironment::new();
    let output = install_command(&env)
        .arg("--prepare-only")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert!(env.vcap("store/warden_cpi/stemcells").is_dir());
    assert!(env.vcap("sys/run/warden_cpi").is_dir());
}

#[test]
fn test_render_template_binary() {
    let env = TestEnvironment::new();
    let dir = env.fixtures.path();

    std::fs::write(
        dir.join("context.json"),
        r#"{"default_properties": {"port": 25555, "host": "0.0.0.0"}, "job_properties": {"port": 8080}}"#,
    )
    .unwrap();
    std::fs::write(dir.join("server.erb"), "listen {{p \"host\"}}:{{p \"port\"}}\n").unwrap();

    let output = Command::new(RENDER_BIN)
        .arg(dir.join("context.json"))
        .arg(dir.join("server.erb"))
        .arg(dir.join("out/server.conf"))
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(dir.join("out/server.conf")).unwrap(),
        "listen 0.0.0.0:8080\n"
    );
}

#[test]
fn test_render_template_malformed_exit_code() {
    let env = TestEnvironment::new();
    let dir = env.fixtures.path();

    std::fs::write(dir.join("context.json"), r#"{"default_properties": {}, "job_properties": {}}"#)
        .unwrap();
    std::fs::write(dir.join("broken.erb"), "{{#if_p \"x\"}}never closed").unwrap();

    let output = Command::new(RENDER_BIN)
        .arg(dir.join("context.json"))
        .arg(dir.join("broken.erb"))
        .arg(dir.join("out"))
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(6));
}
