//! Error types for nx-affected with contextual messages and exit codes
//!
//! Every failure in a run is terminal: nothing here is retried. The error
//! categories mirror the stages of a run (preconditions, tool invocation,
//! output parsing, version checks, workspace manifests) so the CLI can print
//! a targeted hint and exit with a stable code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for nx-affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (nx, git, network, I/O)
  System = 2,
  /// Validation failure (unsupported versions or workspace layouts)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for nx-affected
#[derive(Debug)]
pub enum AffectedError {
  /// Configuration errors
  Config(ConfigError),

  /// Workspace preconditions (package.json, nx script, lock files)
  Precondition(PreconditionError),

  /// External tool invocation errors
  Tool(ToolError),

  /// Tool output could not be interpreted
  Parse(ParseError),

  /// Installed nx is incompatible
  Version(VersionError),

  /// Workspace manifest errors
  Workspace(WorkspaceError),

  /// Git operation errors
  Git(GitError),

  /// Build history lookup errors
  History(HistoryError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl AffectedError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    AffectedError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    AffectedError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      AffectedError::Message { message, context, help } => AffectedError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      AffectedError::Io(err) => AffectedError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      AffectedError::Config(_) => ExitCode::User,
      AffectedError::Precondition(_) => ExitCode::User,
      AffectedError::Tool(_) => ExitCode::System,
      AffectedError::Parse(_) => ExitCode::System,
      AffectedError::Version(_) => ExitCode::Validation,
      AffectedError::Workspace(_) => ExitCode::Validation,
      AffectedError::Git(_) => ExitCode::System,
      AffectedError::History(_) => ExitCode::System,
      AffectedError::Io(_) => ExitCode::System,
      AffectedError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      AffectedError::Config(e) => e.help_message(),
      AffectedError::Precondition(e) => e.help_message(),
      AffectedError::Version(e) => e.help_message(),
      AffectedError::Workspace(e) => e.help_message(),
      AffectedError::History(e) => e.help_message(),
      AffectedError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for AffectedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AffectedError::Config(e) => write!(f, "{}", e),
      AffectedError::Precondition(e) => write!(f, "{}", e),
      AffectedError::Tool(e) => write!(f, "{}", e),
      AffectedError::Parse(e) => write!(f, "{}", e),
      AffectedError::Version(e) => write!(f, "{}", e),
      AffectedError::Workspace(e) => write!(f, "{}", e),
      AffectedError::Git(e) => write!(f, "{}", e),
      AffectedError::History(e) => write!(f, "{}", e),
      AffectedError::Io(e) => write!(f, "I/O error: {}", e),
      AffectedError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for AffectedError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      AffectedError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for AffectedError {
  fn from(err: io::Error) -> Self {
    AffectedError::Io(err)
  }
}

impl From<String> for AffectedError {
  fn from(msg: String) -> Self {
    AffectedError::message(msg)
  }
}

impl From<&str> for AffectedError {
  fn from(msg: &str) -> Self {
    AffectedError::message(msg)
  }
}

impl From<toml_edit::de::Error> for AffectedError {
  fn from(err: toml_edit::de::Error) -> Self {
    AffectedError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for AffectedError {
  fn from(err: serde_json::Error) -> Self {
    AffectedError::message(format!("JSON error: {}", err))
  }
}

impl From<ignore::Error> for AffectedError {
  fn from(err: ignore::Error) -> Self {
    AffectedError::message(format!("Workspace scan error: {}", err))
  }
}

impl From<reqwest::Error> for AffectedError {
  fn from(err: reqwest::Error) -> Self {
    AffectedError::History(HistoryError::Request {
      reason: err.to_string(),
    })
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Field present but invalid
  InvalidField { field: String, reason: String },

  /// Required input missing (e.g. repository for history lookup)
  MissingField { field: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::MissingField { field } if field == "repository" => {
        Some("Pass --repository owner/repo or set GITHUB_REPOSITORY.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::InvalidField { field, reason } => {
        write!(f, "Invalid config value for '{}': {}", field, reason)
      }
      ConfigError::MissingField { field } => {
        write!(f, "Missing required setting: {}", field)
      }
    }
  }
}

/// Workspace preconditions checked before nx is ever invoked
#[derive(Debug)]
pub enum PreconditionError {
  /// package.json missing, unreadable or not JSON
  PackageJsonUnreadable { path: PathBuf, reason: String },

  /// package.json has no script fronting nx
  MissingScript { path: PathBuf, script: String },

  /// None of the known lock files exist
  PackageManagerNotDetected { root: PathBuf, markers: Vec<String> },
}

impl PreconditionError {
  fn help_message(&self) -> Option<String> {
    match self {
      PreconditionError::PackageJsonUnreadable { .. } => {
        Some("Run nx-affected from the root of an Nx workspace, or pass --workspace.".to_string())
      }
      PreconditionError::MissingScript { script, .. } => Some(format!(
        "Add `\"{}\": \"nx\"` to the scripts section, or set up the project with Nx's CLI.",
        script
      )),
      PreconditionError::PackageManagerNotDetected { .. } => {
        Some("Commit the lock file of your package manager (npm, yarn or pnpm).".to_string())
      }
    }
  }
}

impl fmt::Display for PreconditionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionError::PackageJsonUnreadable { path, reason } => {
        write!(f, "Failed to load '{}': {}", path.display(), reason)
      }
      PreconditionError::MissingScript { path, script } => {
        write!(f, "Failed to locate the '{}' script in {}", script, path.display())
      }
      PreconditionError::PackageManagerNotDetected { root, markers } => {
        write!(
          f,
          "Failed to detect the package manager in {} (looked for {})",
          root.display(),
          markers.join(", ")
        )
      }
    }
  }
}

/// External process errors
#[derive(Debug)]
pub enum ToolError {
  /// Process could not be started
  Spawn { command: String, reason: String },

  /// Process exited non-zero
  CommandFailed {
    command: String,
    status: Option<i32>,
    stderr: String,
  },
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::Spawn { command, reason } => {
        write!(f, "Failed to run `{}`: {}", command, reason)
      }
      ToolError::CommandFailed { command, status, stderr } => {
        match status {
          Some(code) => write!(f, "Command `{}` exited with status {}", command, code)?,
          None => write!(f, "Command `{}` was terminated by a signal", command)?,
        }
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
    }
  }
}

/// Structured output expected from nx but absent or malformed
#[derive(Debug)]
pub enum ParseError {
  /// No line starting with `[` or `{`
  MissingPayload { command: String },

  /// Payload is not valid JSON or has the wrong shape
  InvalidPayload { command: String, reason: String },
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParseError::MissingPayload { command } => {
        write!(f, "No JSON payload found in the output of `{}`", command)
      }
      ParseError::InvalidPayload { command, reason } => {
        write!(f, "Unexpected JSON payload from `{}`: {}", command, reason)
      }
    }
  }
}

/// Installed nx does not meet the configured minimum
#[derive(Debug)]
pub enum VersionError {
  /// Resolved version is older than the minimum
  TooOld { found: String, minimum: String },

  /// No version could be read from `nx --version`
  Unknown { minimum: String },

  /// Version report is not a valid version
  Invalid { value: String, reason: String },
}

impl VersionError {
  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::TooOld { minimum, .. } | VersionError::Unknown { minimum } => Some(format!(
        "Upgrade nx to {} or newer, or lower `min_version` in nx-affected.toml.",
        minimum
      )),
      VersionError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::TooOld { found, minimum } => {
        write!(f, "Installed nx {} is older than the minimum supported version {}", found, minimum)
      }
      VersionError::Unknown { minimum } => {
        write!(
          f,
          "Could not determine the installed nx version (minimum supported is {})",
          minimum
        )
      }
      VersionError::Invalid { value, reason } => {
        write!(f, "Invalid nx version '{}': {}", value, reason)
      }
    }
  }
}

/// Workspace manifest errors
#[derive(Debug)]
pub enum WorkspaceError {
  /// Consolidated manifest without per-project tags
  UnsupportedVersion { path: PathBuf, version: Option<u64> },

  /// Manifest unreadable or malformed
  InvalidManifest { path: PathBuf, reason: String },
}

impl WorkspaceError {
  fn help_message(&self) -> Option<String> {
    match self {
      WorkspaceError::UnsupportedVersion { .. } => Some(
        "Tag filtering needs project tags; migrate the workspace with `nx g @nrwl/workspace:convert-to-nx-project`."
          .to_string(),
      ),
      WorkspaceError::InvalidManifest { .. } => None,
    }
  }
}

impl fmt::Display for WorkspaceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WorkspaceError::UnsupportedVersion { path, version } => {
        let version = version.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string());
        write!(
          f,
          "Unsupported workspace version for tag filtering: {} (version {})",
          path.display(),
          version
        )
      }
      WorkspaceError::InvalidManifest { path, reason } => {
        write!(f, "Failed to read workspace manifest {}: {}", path.display(), reason)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Build history lookup errors
#[derive(Debug)]
pub enum HistoryError {
  /// HTTP request failed or returned a non-success status
  Request { reason: String },
}

impl HistoryError {
  fn help_message(&self) -> Option<String> {
    match self {
      HistoryError::Request { reason } if reason.contains("401") || reason.contains("403") => {
        Some("Check that the token has `actions: read` permission on the repository.".to_string())
      }
      HistoryError::Request { reason } if reason.contains("404") => {
        Some("Check the workflow id (file name such as `ci.yml` or numeric id).".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for HistoryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HistoryError::Request { reason } => {
        write!(f, "Failed to query the last successful build: {}", reason)
      }
    }
  }
}

/// Result type alias for nx-affected
pub type AffectedResult<T> = Result<T, AffectedError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<AffectedError>,
{
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &AffectedError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
