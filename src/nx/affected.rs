//! Affected application extraction
//!
//! Resolves the nx version, picks the matching [`Dialect`], runs the query
//! and turns the output into an [`AffectedSet`].

use super::command::CommandRunner;
use super::dialect::Dialect;
use super::version::{ToolVersion, parse_lenient, resolve_version};
use crate::core::config::NxConfig;
use crate::core::error::{AffectedError, AffectedResult, VersionError};
use semver::Version;
use std::collections::HashSet;

/// Unique application names in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
  apps: Vec<String>,
}

impl AffectedSet {
  pub fn is_empty(&self) -> bool {
    self.apps.is_empty()
  }

  pub fn len(&self) -> usize {
    self.apps.len()
  }

  pub fn into_vec(self) -> Vec<String> {
    self.apps
  }
}

impl FromIterator<String> for AffectedSet {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    let mut seen = HashSet::new();
    let apps = iter
      .into_iter()
      .filter(|app| !app.is_empty())
      .filter(|app| seen.insert(app.clone()))
      .collect();
    Self { apps }
  }
}

impl<'a> IntoIterator for &'a AffectedSet {
  type Item = &'a String;
  type IntoIter = std::slice::Iter<'a, String>;

  fn into_iter(self) -> Self::IntoIter {
    self.apps.iter()
  }
}

/// Version thresholds that drive dialect selection
#[derive(Debug, Clone)]
pub struct DialectPolicy {
  pub modern_threshold: Version,
  pub min_version: Option<Version>,
}

impl DialectPolicy {
  pub fn from_config(config: &NxConfig) -> AffectedResult<Self> {
    Ok(Self {
      modern_threshold: parse_lenient(&config.modern_threshold)?,
      min_version: config.min_version.as_deref().map(parse_lenient).transpose()?,
    })
  }

  /// Pick the dialect for a resolved version, enforcing the minimum if one is set
  pub fn choose(&self, version: &ToolVersion) -> AffectedResult<Dialect> {
    let effective = version.effective_semver()?;

    if let Some(ref minimum) = self.min_version {
      match effective {
        None => {
          return Err(AffectedError::Version(VersionError::Unknown {
            minimum: minimum.to_string(),
          }));
        }
        Some(ref found) if found < minimum => {
          return Err(AffectedError::Version(VersionError::TooOld {
            found: found.to_string(),
            minimum: minimum.to_string(),
          }));
        }
        Some(_) => {}
      }
    }

    if effective.is_none() {
      tracing::warn!("could not determine the nx version, using the affected:apps dialect");
    }

    Ok(Dialect::select(effective.as_ref(), &self.modern_threshold))
  }
}

impl Default for DialectPolicy {
  fn default() -> Self {
    Self {
      modern_threshold: Version::new(16, 0, 0),
      min_version: None,
    }
  }
}

/// Ask nx which apps are affected since `base` (all apps when `None`)
pub fn get_affected(base: Option<&str>, tool: &dyn CommandRunner, policy: &DialectPolicy) -> AffectedResult<AffectedSet> {
  let version = resolve_version(tool)?;
  let dialect = policy.choose(&version)?;
  tracing::info!(dialect = dialect.name(), base = base.unwrap_or("<all>"), "querying affected apps");

  let args = dialect.query_args(base);
  let lines = tool.run(&args)?;
  let apps: AffectedSet = dialect.parse(&lines, &tool.describe(&args))?.into_iter().collect();

  tracing::info!(count = apps.len(), "affected apps resolved");
  Ok(apps)
}
