//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Canned answers for the fake package manager
pub struct FakeNx<'a> {
  /// Printed for `nx --version`
  pub version: &'a str,
  /// Printed for every other nx invocation
  pub query: &'a str,
}

/// A test workspace with git history and a fake package manager on PATH
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  bin: PathBuf,
  calls: PathBuf,
}

impl TestWorkspace {
  /// Create a workspace with a package.json exposing an `nx` script
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().join("ws");
    let bin = root.path().join("bin");
    let calls = root.path().join("calls.log");
    std::fs::create_dir_all(&path)?;
    std::fs::create_dir_all(&bin)?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(
      path.join("package.json"),
      r#"{
  "name": "test-workspace",
  "private": true,
  "scripts": {
    "nx": "nx"
  }
}
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial workspace setup"])?;

    Ok(Self {
      _root: root,
      path,
      bin,
      calls,
    })
  }

  /// Write a file relative to the workspace root
  pub fn write(&self, relative: &str, content: &str) -> Result<()> {
    let file = self.path.join(relative);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))?;
    Ok(())
  }

  /// Commit current changes and return the new HEAD
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Install a fake `manager` executable answering like nx would
  ///
  /// `pnpm --version` (the manager's own version probe) answers `pnpm_version`.
  pub fn install_manager(&self, manager: &str, nx: &FakeNx, pnpm_version: &str) -> Result<()> {
    let version_file = self.bin.join(format!("{}.version", manager));
    let query_file = self.bin.join(format!("{}.query", manager));
    std::fs::write(&version_file, format!("{}\n", nx.version))?;
    std::fs::write(&query_file, format!("{}\n", nx.query))?;

    let script = format!(
      r#"#!/bin/sh
echo "{manager} $*" >> "{calls}"
case "$*" in
  "--version") echo "{pnpm_version}" ;;
  *--version*) cat "{version}" ;;
  *) cat "{query}" ;;
esac
"#,
      manager = manager,
      calls = self.calls.display(),
      pnpm_version = pnpm_version,
      version = version_file.display(),
      query = query_file.display(),
    );

    let exe = self.bin.join(manager);
    std::fs::write(&exe, script)?;
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
  }

  /// Command lines the fake package managers received, in order
  pub fn calls(&self) -> Result<Vec<String>> {
    if !self.calls.exists() {
      return Ok(Vec::new());
    }
    Ok(
      std::fs::read_to_string(&self.calls)?
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  /// Run nx-affected in the workspace with the fake managers first on PATH
  pub fn run(&self, args: &[&str]) -> Result<Output> {
    self.run_with_env(args, &[])
  }

  /// Like [`TestWorkspace::run`] with extra environment variables
  pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Result<Output> {
    let path_env = match std::env::var_os("PATH") {
      Some(existing) => {
        let mut paths = vec![self.bin.clone()];
        paths.extend(std::env::split_paths(&existing));
        std::env::join_paths(paths)?
      }
      None => self.bin.clone().into_os_string(),
    };

    let mut command = Command::new(env!("CARGO_BIN_EXE_nx-affected"));
    command
      .current_dir(&self.path)
      .args(args)
      .env("PATH", path_env)
      .env_remove("RUST_LOG")
      .env_remove("NX_AFFECTED_LOG")
      .env_remove("GITHUB_TOKEN")
      .env_remove("GITHUB_REPOSITORY")
      .env_remove("GITHUB_API_URL")
      .env_remove("GITHUB_OUTPUT");
    for (key, value) in env {
      command.env(key, value);
    }

    command.output().context("Failed to run nx-affected")
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Stdout of a successful run, failing with both streams otherwise
pub fn stdout_of(output: &Output) -> Result<String> {
  if !output.status.success() {
    anyhow::bail!(
      "nx-affected failed ({:?})\nstdout: {}\nstderr: {}",
      output.status.code(),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
