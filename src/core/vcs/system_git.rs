//! System git backend
//!
//! Only what resolving a base commit needs: open the repository and check
//! that a commit is present in the local clone (shallow CI checkouts often
//! lack the last successful build's commit).

use crate::core::error::{AffectedError, AffectedResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using the system `git` binary
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> AffectedResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(AffectedError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(AffectedError::Git(GitError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: stderr.to_string(),
      }));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Whether `sha` names a commit present in this clone
  pub fn commit_exists(&self, sha: &str) -> AffectedResult<bool> {
    // Never let a revision be read as a git option
    if sha.is_empty() || sha.starts_with('-') {
      return Ok(false);
    }

    let spec = format!("{}^{{commit}}", sha);
    let output = self
      .git_cmd()
      .args(["cat-file", "-e", &spec])
      .output()
      .context("Failed to run git cat-file")?;

    Ok(output.status.success())
  }

  /// Create a git command with an isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}
