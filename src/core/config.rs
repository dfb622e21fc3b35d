use crate::core::error::{AffectedError, AffectedResult, ConfigError, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default package.json script that fronts nx
pub const DEFAULT_SCRIPT: &str = "nx";

/// First nx release line that ships `nx show projects --type app --json`
pub const DEFAULT_MODERN_THRESHOLD: &str = "16.0.0";

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Configuration for nx-affected
/// Searched in order: nx-affected.toml, .nx-affected.toml, .github/nx-affected.toml, .config/nx-affected.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffectedConfig {
  #[serde(default)]
  pub nx: NxConfig,
  #[serde(default)]
  pub github: GithubConfig,
}

/// How nx is invoked and which dialect is chosen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NxConfig {
  /// package.json script name (default: "nx")
  #[serde(default = "default_script")]
  pub script: String,

  /// Versions at or above this use the `show projects` dialect
  #[serde(default = "default_modern_threshold")]
  pub modern_threshold: String,

  /// Fail instead of falling back when nx is older than this
  #[serde(default)]
  pub min_version: Option<String>,
}

fn default_script() -> String {
  DEFAULT_SCRIPT.to_string()
}

fn default_modern_threshold() -> String {
  DEFAULT_MODERN_THRESHOLD.to_string()
}

impl Default for NxConfig {
  fn default() -> Self {
    Self {
      script: default_script(),
      modern_threshold: default_modern_threshold(),
      min_version: None,
    }
  }
}

impl NxConfig {
  /// Validate version fields
  pub fn validate(&self) -> AffectedResult<()> {
    if self.script.trim().is_empty() {
      return Err(AffectedError::Config(ConfigError::InvalidField {
        field: "nx.script".to_string(),
        reason: "must not be empty".to_string(),
      }));
    }

    if let Err(e) = crate::nx::version::parse_lenient(&self.modern_threshold) {
      return Err(AffectedError::Config(ConfigError::InvalidField {
        field: "nx.modern_threshold".to_string(),
        reason: e.to_string(),
      }));
    }

    if let Some(ref min) = self.min_version
      && let Err(e) = crate::nx::version::parse_lenient(min)
    {
      return Err(AffectedError::Config(ConfigError::InvalidField {
        field: "nx.min_version".to_string(),
        reason: e.to_string(),
      }));
    }

    Ok(())
  }
}

/// Where the last successful build is looked up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
  /// `owner/repo`
  #[serde(default)]
  pub repository: Option<String>,

  /// Workflow file name or numeric id
  #[serde(default)]
  pub workflow_id: Option<String>,

  /// Branch whose successful runs are considered
  #[serde(default)]
  pub branch: Option<String>,

  /// REST endpoint (GitHub Enterprise)
  #[serde(default)]
  pub api_url: Option<String>,
}

impl GithubConfig {
  pub fn validate(&self) -> AffectedResult<()> {
    if let Some(ref repo) = self.repository {
      split_repository(repo)?;
    }
    Ok(())
  }

  pub fn api_url(&self) -> &str {
    self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
  }
}

/// Split `owner/repo` into its parts
pub fn split_repository(repo: &str) -> AffectedResult<(&str, &str)> {
  match repo.split_once('/') {
    Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok((owner, name)),
    _ => Err(AffectedError::Config(ConfigError::InvalidField {
      field: "github.repository".to_string(),
      reason: format!("expected 'owner/repo', got '{}'", repo),
    })),
  }
}

impl AffectedConfig {
  /// Find config file in search order
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("nx-affected.toml"),
      path.join(".nx-affected.toml"),
      path.join(".github").join("nx-affected.toml"),
      path.join(".config").join("nx-affected.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> AffectedResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: AffectedConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
  }

  pub fn validate(&self) -> AffectedResult<()> {
    self.nx.validate()?;
    self.github.validate()
  }
}
