//! GitHub Actions build history
//!
//! Looks up the most recent successful `push` run of a workflow on a branch
//! through the REST API and returns its head commit.

use super::BuildHistory;
use crate::core::config::split_repository;
use crate::core::error::{AffectedError, AffectedResult, HistoryError};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct WorkflowRuns {
  #[serde(default)]
  workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRun {
  head_sha: Option<String>,
  #[serde(default)]
  head_commit: Option<HeadCommit>,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
  id: String,
}

/// GitHub REST client scoped to one repository
pub struct GithubBuildHistory {
  api_url: String,
  owner: String,
  repo: String,
  token: String,
  client: reqwest::blocking::Client,
}

impl GithubBuildHistory {
  pub fn new(api_url: &str, repository: &str, token: impl Into<String>) -> AffectedResult<Self> {
    let (owner, repo) = split_repository(repository)?;
    let client = reqwest::blocking::Client::builder()
      .user_agent(concat!("nx-affected/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      api_url: api_url.trim_end_matches('/').to_string(),
      owner: owner.to_string(),
      repo: repo.to_string(),
      token: token.into(),
      client,
    })
  }

  fn runs_url(&self, workflow_id: &str) -> String {
    format!(
      "{}/repos/{}/{}/actions/workflows/{}/runs",
      self.api_url, self.owner, self.repo, workflow_id
    )
  }
}

impl BuildHistory for GithubBuildHistory {
  fn last_successful_commit(&self, workflow_id: &str, branch: &str) -> AffectedResult<Option<String>> {
    let url = self.runs_url(workflow_id);
    tracing::debug!(%url, branch, "querying workflow runs");

    let response = self
      .client
      .get(&url)
      .bearer_auth(&self.token)
      .header("Accept", "application/vnd.github+json")
      .query(&[
        ("status", "success"),
        ("branch", branch),
        ("event", "push"),
        ("per_page", "1"),
      ])
      .send()?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().unwrap_or_default();
      return Err(AffectedError::History(HistoryError::Request {
        reason: format!("{} returned {}: {}", url, status, body.trim()),
      }));
    }

    let body = response.text()?;
    let commit = parse_runs(&body)?;
    tracing::info!(commit = commit.as_deref().unwrap_or("none"), "last successful build");
    Ok(commit)
  }
}

/// Head commit of the first run in a `workflow_runs` response
fn parse_runs(body: &str) -> AffectedResult<Option<String>> {
  let runs: WorkflowRuns = serde_json::from_str(body).map_err(|e| {
    AffectedError::History(HistoryError::Request {
      reason: format!("unexpected response: {}", e),
    })
  })?;

  Ok(runs.workflow_runs.into_iter().next().and_then(|run| {
    run
      .head_sha
      .or_else(|| run.head_commit.map(|c| c.id))
      .filter(|sha| !sha.is_empty())
  }))
}
