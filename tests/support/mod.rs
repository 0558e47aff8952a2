#![allow(dead_code)]

use agentcore_role::DeploymentContext;
use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

pub const REGION: &str = "us-east-1";
pub const ACCOUNT: &str = "111122223333";

pub fn context() -> DeploymentContext {
    DeploymentContext::new("aws", REGION, ACCOUNT).expect("valid test context")
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn cli_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_agentcore-role"))
}

/// Command for the CLI with the deployment context taken from flags only.
pub fn cli_command() -> Command {
    let mut cmd = Command::new(cli_binary());
    for var in ["AWS_PARTITION", "AWS_REGION", "AWS_ACCOUNT_ID", "AGENTCORE_CONTAINER_URI"] {
        cmd.env_remove(var);
    }
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// Write `value` to `name` inside a fresh temp dir; keep the dir alive.
pub fn write_json(value: &Value, name: &str) -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new().context("failed to allocate temp dir")?;
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok((dir, path))
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

pub fn stdout_json(output: &Output) -> Result<Value> {
    serde_json::from_slice(&output.stdout).context("stdout is not JSON")
}
