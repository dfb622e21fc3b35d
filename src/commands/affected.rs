//! `nx-affected` - Show which Nx applications are affected by changes
//!
//! Resolves the base commit (explicit or last successful build), asks nx for
//! the affected applications, narrows them by tags and publishes the result:
//! - on stdout as text, JSON or bare names
//! - as `affected` / `affectedString` step outputs when running in GitHub Actions

use crate::core::context::WorkspaceContext;
use crate::core::error::{AffectedError, AffectedResult, ConfigError, ResultExt};
use crate::history::{self, BuildHistory, GithubBuildHistory, HistoryQuery};
use crate::nx::{self, AffectedSet, CommandRunner, DialectPolicy};
use crate::workspace;
use std::io::Write;
use std::path::PathBuf;

/// Output format for the affected command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  Json,
  NamesOnly,
}

impl OutputFormat {
  pub fn from_str(s: &str) -> AffectedResult<Self> {
    match s.to_lowercase().as_str() {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "names" | "names-only" => Ok(Self::NamesOnly),
      _ => Err(AffectedError::message(format!(
        "Unknown format '{}'. Valid formats: text, json, names-only",
        s
      ))),
    }
  }
}

/// GitHub build-history inputs after merging CLI, env and config
#[derive(Debug, Clone, Default)]
pub struct HistorySettings {
  pub token: Option<String>,
  pub repository: Option<String>,
  pub workflow_id: Option<String>,
  pub branch: Option<String>,
  pub api_url: Option<String>,
}

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct AffectedArgs {
  pub base: Option<String>,
  pub tags: Vec<String>,
  pub format: String,
  pub github_output: Option<PathBuf>,
  pub history: HistorySettings,
}

/// Run the affected command
pub fn run_affected(ctx: &WorkspaceContext, args: AffectedArgs) -> AffectedResult<()> {
  let output_format = OutputFormat::from_str(&args.format)?;

  let base = resolve_base_commit(ctx, args.base.as_deref(), &args.history)?;
  let affected = resolve_affected(ctx, base.as_deref(), &args.tags)?;

  display_results(&affected, output_format)?;

  if let Some(ref path) = args.github_output {
    publish_github_outputs(path, &affected)?;
  }

  Ok(())
}

/// Resolve the affected applications for `base` (all apps when `None`), filtered by `tags`
pub fn resolve_affected(ctx: &WorkspaceContext, base: Option<&str>, tags: &[String]) -> AffectedResult<Vec<String>> {
  let tool = nx::locate(ctx.workspace_root(), &ctx.config.nx.script)?;
  resolve_affected_with(ctx, &tool, base, tags)
}

/// [`resolve_affected`] with an already located nx runner
pub fn resolve_affected_with(
  ctx: &WorkspaceContext,
  tool: &dyn CommandRunner,
  base: Option<&str>,
  tags: &[String],
) -> AffectedResult<Vec<String>> {
  let policy = DialectPolicy::from_config(&ctx.config.nx)?;
  let apps: AffectedSet = nx::get_affected(base, tool, &policy)?;
  let apps = workspace::filter_by_tags(ctx.workspace_root(), apps, tags)?;
  Ok(apps.into_vec())
}

/// Explicit base, else the last successful build when enough inputs are available
fn resolve_base_commit(
  ctx: &WorkspaceContext,
  explicit: Option<&str>,
  settings: &HistorySettings,
) -> AffectedResult<Option<String>> {
  if explicit.is_some() {
    return history::resolve_base(ctx.workspace_root(), explicit, None);
  }

  let github = &ctx.config.github;
  let workflow_id = settings.workflow_id.clone().or_else(|| github.workflow_id.clone());
  let branch = settings.branch.clone().or_else(|| github.branch.clone());

  let (Some(token), Some(workflow_id), Some(branch)) = (settings.token.as_deref(), workflow_id, branch) else {
    tracing::debug!("build history lookup skipped (needs token, workflow id and branch)");
    return history::resolve_base(ctx.workspace_root(), None, None);
  };

  let repository = settings
    .repository
    .clone()
    .or_else(|| github.repository.clone())
    .ok_or_else(|| {
      AffectedError::Config(ConfigError::MissingField {
        field: "repository".to_string(),
      })
    })?;
  let api_url = settings.api_url.as_deref().unwrap_or_else(|| github.api_url());

  let client = GithubBuildHistory::new(api_url, &repository, token)?;
  let query = HistoryQuery { workflow_id, branch };
  let source: &dyn BuildHistory = &client;
  history::resolve_base(ctx.workspace_root(), None, Some((source, &query)))
}

/// Display results in the requested format
fn display_results(affected: &[String], format: OutputFormat) -> AffectedResult<()> {
  match format {
    OutputFormat::Text => display_text(affected),
    OutputFormat::Json => display_json(affected),
    OutputFormat::NamesOnly => display_names_only(affected),
  }
}

fn display_text(affected: &[String]) -> AffectedResult<()> {
  println!("Affected applications: {}", affected.len());
  for app in affected {
    println!("  🎯 {}", app);
  }
  Ok(())
}

fn display_json(affected: &[String]) -> AffectedResult<()> {
  use serde_json::json;

  let output = json!({
      "affected": affected,
      "affectedString": affected.join(","),
      "count": affected.len(),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);
  Ok(())
}

fn display_names_only(affected: &[String]) -> AffectedResult<()> {
  for app in affected {
    println!("{}", app);
  }
  Ok(())
}

/// Append `affected` (JSON array) and `affectedString` (comma list) to a GitHub step output file
pub fn publish_github_outputs(path: &std::path::Path, affected: &[String]) -> AffectedResult<()> {
  let mut file = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(path)
    .with_context(|| format!("Failed to open step output file {}", path.display()))?;

  let json = serde_json::to_string(affected)?;
  let joined = affected.join(",");
  writeln!(file, "affected={}", json).context("Failed to write step outputs")?;
  writeln!(file, "affectedString={}", joined).context("Failed to write step outputs")?;

  tracing::info!(affected = %json, "published step outputs");
  Ok(())
}
