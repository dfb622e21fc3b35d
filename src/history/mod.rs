//! Base commit resolution
//!
//! The base for the affected query is either given explicitly or taken from
//! the last successful CI build. A build-history commit the local clone does
//! not have is dropped, which makes nx fall back to "all apps". An explicit
//! base is always kept; a missing one is only reported.

pub mod github;

use crate::core::error::AffectedResult;
use crate::core::vcs::SystemGit;
use std::path::Path;

pub use github::GithubBuildHistory;

/// Source of "last successful build" commits
pub trait BuildHistory {
  /// Head commit of the latest successful run of `workflow_id` on `branch`
  fn last_successful_commit(&self, workflow_id: &str, branch: &str) -> AffectedResult<Option<String>>;
}

/// Which workflow/branch to ask the build history about
#[derive(Debug, Clone)]
pub struct HistoryQuery {
  pub workflow_id: String,
  pub branch: String,
}

/// Pick the base commit: explicit value first, then build history, then none
pub fn resolve_base(
  root: &Path,
  explicit: Option<&str>,
  history: Option<(&dyn BuildHistory, &HistoryQuery)>,
) -> AffectedResult<Option<String>> {
  if let Some(sha) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
    if !verify_local_commit(root, sha)? {
      tracing::warn!(base = %sha, "explicit base commit not found locally, passing it to nx as given");
    }
    return Ok(Some(sha.to_string()));
  }

  let candidate = match history {
    Some((history, query)) => history.last_successful_commit(&query.workflow_id, &query.branch)?,
    None => None,
  };

  let Some(sha) = candidate else {
    tracing::info!("no base commit, all apps will be considered affected");
    return Ok(None);
  };

  if verify_local_commit(root, &sha)? {
    Ok(Some(sha))
  } else {
    tracing::warn!(base = %sha, "base commit not found locally (shallow clone?), all apps will be considered affected");
    Ok(None)
  }
}

/// Whether `sha` exists in the local clone; assumed present outside a git checkout
fn verify_local_commit(root: &Path, sha: &str) -> AffectedResult<bool> {
  let git = match SystemGit::open(root) {
    Ok(git) => git,
    Err(err) => {
      tracing::warn!("cannot verify base commit outside a git checkout: {}", err);
      return Ok(true);
    }
  };

  let exists = git.commit_exists(sha)?;
  if exists {
    tracing::info!(base = %sha, work_tree = %git.work_tree().display(), "using base commit");
  }
  Ok(exists)
}
