//! `nx --version` parsing
//!
//! Recent nx prints a report with separate local and global installs:
//!
//! ```text
//! Nx Version:
//! - Local: v19.1.0
//! - Global: Not found
//! ```
//!
//! Older releases print just the bare version on a single line. Both shapes
//! resolve to a [`ToolVersion`], where the local install wins.

use super::command::{CommandRunner, args};
use crate::core::error::{AffectedError, AffectedResult, VersionError};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static LOCAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bLocal:\s*(.+?)\s*$").expect("valid regex"));
static GLOBAL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\bGlobal:\s*(.+?)\s*$").expect("valid regex"));
static LEGACY_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^v?(\d+(?:\.\d+){0,2}(?:-[0-9A-Za-z.-]+)?)").expect("valid regex"));

/// Versions reported by nx
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolVersion {
  pub local: Option<String>,
  pub global: Option<String>,
}

impl ToolVersion {
  /// Local install if present, otherwise the global one
  pub fn effective(&self) -> Option<&str> {
    self.local.as_deref().or(self.global.as_deref())
  }

  /// Effective version as a comparable semver value
  pub fn effective_semver(&self) -> AffectedResult<Option<Version>> {
    self.effective().map(parse_lenient).transpose()
  }
}

/// Run `nx --version` and parse the report
pub fn resolve_version(tool: &dyn CommandRunner) -> AffectedResult<ToolVersion> {
  let lines = tool.run(&args(&["--version"]))?;
  let version = parse_version_report(&lines);
  tracing::info!(
    local = version.local.as_deref().unwrap_or("-"),
    global = version.global.as_deref().unwrap_or("-"),
    "resolved nx version"
  );
  Ok(version)
}

/// Scan version report lines
///
/// Per line the patterns are tried in order: `Local:`, `Global:`, then a bare
/// leading version. The bare form ends the scan since that format has no
/// local/global distinction.
pub fn parse_version_report(lines: &[String]) -> ToolVersion {
  let mut version = ToolVersion::default();

  for line in lines {
    let line = line.trim();
    if let Some(caps) = LOCAL_RE.captures(line) {
      version.local = normalize(&caps[1]);
    } else if let Some(caps) = GLOBAL_RE.captures(line) {
      version.global = normalize(&caps[1]);
    } else if let Some(caps) = LEGACY_RE.captures(line) {
      version.local = Some(caps[1].to_string());
      break;
    }
  }

  version
}

/// Strip a leading `v`; "Not found" means absent
fn normalize(raw: &str) -> Option<String> {
  let value = raw.trim();
  if value.is_empty() || value.eq_ignore_ascii_case("not found") {
    return None;
  }
  Some(value.strip_prefix('v').unwrap_or(value).to_string())
}

/// Parse a version, padding missing minor/patch components (`19` -> `19.0.0`)
pub fn parse_lenient(raw: &str) -> AffectedResult<Version> {
  let raw = raw.trim();
  let raw = raw.strip_prefix('v').unwrap_or(raw);
  let (core, rest) = match raw.find(['-', '+']) {
    Some(idx) => raw.split_at(idx),
    None => (raw, ""),
  };

  let parts = core.split('.').count();
  let padded = match parts {
    1 => format!("{}.0.0{}", core, rest),
    2 => format!("{}.0{}", core, rest),
    _ => raw.to_string(),
  };

  Version::parse(&padded).map_err(|e| {
    AffectedError::Version(VersionError::Invalid {
      value: raw.to_string(),
      reason: e.to_string(),
    })
  })
}
