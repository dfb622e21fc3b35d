//! Workspace context - built once in main.rs, passed by reference
//!
//! Holds the workspace root and the loaded configuration so no component
//! reads the current directory or environment on its own.

use crate::core::config::AffectedConfig;
use crate::core::error::{AffectedError, AffectedResult, ResultExt};
use std::path::{Path, PathBuf};

/// Workspace-level inputs shared by every stage of a run.
#[derive(Debug, Clone)]
pub struct WorkspaceContext {
  /// Workspace root directory (absolute path)
  pub root: PathBuf,

  /// nx-affected configuration (defaults when no file exists)
  pub config: AffectedConfig,
}

impl WorkspaceContext {
  /// Build workspace context from a root directory.
  pub fn build(workspace_root: &Path) -> AffectedResult<Self> {
    if !workspace_root.is_dir() {
      return Err(AffectedError::with_help(
        format!("Workspace root {} is not a directory", workspace_root.display()),
        "Pass --workspace pointing at the directory that contains package.json.",
      ));
    }

    let root = workspace_root
      .canonicalize()
      .with_context(|| format!("Failed to resolve {}", workspace_root.display()))?;
    let config = AffectedConfig::load(&root)?;

    Ok(Self { root, config })
  }

  /// Build a context with an explicit configuration
  #[cfg(test)]
  pub fn with_config(root: PathBuf, config: AffectedConfig) -> Self {
    Self { root, config }
  }

  /// Get workspace root as Path reference (convenience)
  pub fn workspace_root(&self) -> &Path {
    &self.root
  }
}
