//! Tag filtering of affected apps
//!
//! A tag expression is either `tag` (must be present) or `-:tag` (must be
//! absent). All expressions must hold for an app to be kept.

use super::manifest::{ManifestSource, resolve_manifest};
use crate::core::error::AffectedResult;
use crate::nx::AffectedSet;
use std::path::Path;

/// Prefix marking a negated tag
pub const NEGATION_MARKER: &str = "-:";

/// Positive and negative tag constraints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
  pub include: Vec<String>,
  pub exclude: Vec<String>,
}

impl TagFilter {
  /// Split expressions by the negation marker; blank expressions are ignored
  pub fn parse<S: AsRef<str>>(expressions: &[S]) -> Self {
    let mut filter = Self::default();
    for expression in expressions {
      let expression = expression.as_ref().trim();
      if expression.is_empty() {
        continue;
      }
      match expression.strip_prefix(NEGATION_MARKER) {
        Some(tag) if !tag.is_empty() => filter.exclude.push(tag.to_string()),
        Some(_) => {}
        None => filter.include.push(expression.to_string()),
      }
    }
    filter
  }

  pub fn is_empty(&self) -> bool {
    self.include.is_empty() && self.exclude.is_empty()
  }

  /// Whether a project with these tags passes
  pub fn accepts(&self, tags: &[String]) -> bool {
    let has = |tag: &String| tags.contains(tag);
    !self.exclude.iter().any(has) && self.include.iter().all(has)
  }

  /// Keep the apps whose tags pass, in input order
  pub fn apply(&self, apps: &AffectedSet, manifest: &dyn ManifestSource) -> AffectedResult<AffectedSet> {
    let mut kept = Vec::new();
    for app in apps {
      let tags = manifest.lookup_tags(app)?;
      if self.accepts(&tags) {
        kept.push(app.clone());
      } else {
        tracing::debug!(app = %app, ?tags, "filtered out by tags");
      }
    }
    Ok(kept.into_iter().collect())
  }
}

/// Narrow `apps` by tag expressions, resolving the workspace manifest only when needed
pub fn filter_by_tags<S: AsRef<str>>(root: &Path, apps: AffectedSet, tags: &[S]) -> AffectedResult<AffectedSet> {
  let filter = TagFilter::parse(tags);
  if filter.is_empty() || apps.is_empty() {
    return Ok(apps);
  }

  let manifest = resolve_manifest(root)?;
  let filtered = filter.apply(&apps, manifest.as_ref())?;
  tracing::info!(
    before = apps.len(),
    after = filtered.len(),
    include = ?filter.include,
    exclude = ?filter.exclude,
    "applied tag filter"
  );
  Ok(filtered)
}
