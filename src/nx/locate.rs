//! Package-manager detection
//!
//! nx is always run through the workspace's package manager so the locally
//! installed version is used. The manager is picked from lock files in a fixed
//! priority order: npm, yarn, pnpm.

use super::command::{CommandRunner, CommandWrapper, args};
use crate::core::error::{AffectedError, AffectedResult, PreconditionError};
use semver::Version;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// package.json fields we care about
#[derive(Debug, Deserialize)]
struct PackageJson {
  #[serde(default)]
  scripts: HashMap<String, serde_json::Value>,
}

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
  Npm,
  Yarn,
  Pnpm,
}

/// A manager, its marker file and how to build the nx wrapper for it
pub struct PackageManagerCandidate {
  pub manager: PackageManager,
  pub marker: &'static str,
  pub factory: fn(root: &Path, script: &str) -> AffectedResult<CommandWrapper>,
}

/// Candidates in priority order
pub static CANDIDATES: [PackageManagerCandidate; 3] = [
  PackageManagerCandidate {
    manager: PackageManager::Npm,
    marker: "package-lock.json",
    factory: npm_wrapper,
  },
  PackageManagerCandidate {
    manager: PackageManager::Yarn,
    marker: "yarn.lock",
    factory: yarn_wrapper,
  },
  PackageManagerCandidate {
    manager: PackageManager::Pnpm,
    marker: "pnpm-lock.yaml",
    factory: pnpm_wrapper,
  },
];

impl PackageManager {
  pub fn name(&self) -> &'static str {
    match self {
      PackageManager::Npm => "npm",
      PackageManager::Yarn => "yarn",
      PackageManager::Pnpm => "pnpm",
    }
  }
}

/// Locate nx in the workspace and build a wrapper that runs it
pub fn locate(root: &Path, script: &str) -> AffectedResult<CommandWrapper> {
  assert_has_script(root, script)?;

  let candidate = detect_candidate(root).ok_or_else(|| {
    AffectedError::Precondition(PreconditionError::PackageManagerNotDetected {
      root: root.to_path_buf(),
      markers: CANDIDATES.iter().map(|c| c.marker.to_string()).collect(),
    })
  })?;

  tracing::info!(package_manager = candidate.manager.name(), "using package manager");
  (candidate.factory)(root, script)
}

/// First candidate whose marker file exists
pub fn detect_candidate(root: &Path) -> Option<&'static PackageManagerCandidate> {
  for candidate in &CANDIDATES {
    if root.join(candidate.marker).exists() {
      return Some(candidate);
    }
    tracing::debug!(marker = candidate.marker, "marker not found");
  }
  None
}

/// Check package.json declares the script that fronts nx
fn assert_has_script(root: &Path, script: &str) -> AffectedResult<()> {
  let path = root.join("package.json");
  let unreadable = |reason: String| {
    AffectedError::Precondition(PreconditionError::PackageJsonUnreadable {
      path: path.clone(),
      reason,
    })
  };

  let content = std::fs::read_to_string(&path).map_err(|e| unreadable(e.to_string()))?;
  let package: PackageJson = serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;

  match package.scripts.get(script) {
    Some(serde_json::Value::String(_)) => {
      tracing::debug!(script, "found script in package.json");
      Ok(())
    }
    _ => Err(AffectedError::Precondition(PreconditionError::MissingScript {
      path: path.clone(),
      script: script.to_string(),
    })),
  }
}

fn npm_wrapper(root: &Path, script: &str) -> AffectedResult<CommandWrapper> {
  Ok(CommandWrapper::new("npm", &["run", script, "--"], root))
}

fn yarn_wrapper(root: &Path, script: &str) -> AffectedResult<CommandWrapper> {
  Ok(CommandWrapper::new("yarn", &[script], root))
}

fn pnpm_wrapper(root: &Path, script: &str) -> AffectedResult<CommandWrapper> {
  let probe = CommandWrapper::new("pnpm", &[], root);
  let reported = probe.run(&args(&["--version"]))?;
  let separator = pnpm_needs_separator(&reported);
  tracing::debug!(separator, "pnpm argument separator");

  if separator {
    Ok(CommandWrapper::new("pnpm", &["run", script, "--"], root))
  } else {
    Ok(CommandWrapper::new("pnpm", &["run", script], root))
  }
}

/// pnpm before 7 treats flags after the script name as its own unless `--`
/// precedes them; from 7 on everything is forwarded, a literal `--` included.
/// An unreadable version report is treated as a current release.
pub fn pnpm_needs_separator(reported: &[String]) -> bool {
  reported
    .iter()
    .find_map(|line| super::version::parse_lenient(line).ok())
    .map(|version| version < Version::new(7, 0, 0))
    .unwrap_or(false)
}
