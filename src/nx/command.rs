//! Process invocation for nx and its package managers
//!
//! A [`CommandWrapper`] owns a program plus a fixed argument prefix
//! (`npm run nx --`, `yarn nx`, ...). Every call appends the caller's
//! arguments, runs the process to completion and returns stdout as
//! trimmed, non-empty lines in the order they were written.

use crate::core::error::{AffectedError, AffectedResult, ToolError};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Anything that can run nx with extra arguments and hand back its stdout lines.
///
/// Implemented by [`CommandWrapper`] for real processes; tests substitute
/// scripted runners.
pub trait CommandRunner {
  /// Run with the given extra arguments
  fn run(&self, args: &[String]) -> AffectedResult<Vec<String>>;

  /// Human-readable command line for logs and errors
  fn describe(&self, args: &[String]) -> String;
}

/// A fixed program and argument prefix, run from the workspace root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandWrapper {
  program: String,
  prefix: Vec<String>,
  cwd: PathBuf,
}

impl CommandWrapper {
  pub fn new(program: impl Into<String>, prefix: &[&str], cwd: &Path) -> Self {
    Self {
      program: program.into(),
      prefix: prefix.iter().map(|s| s.to_string()).collect(),
      cwd: cwd.to_path_buf(),
    }
  }

  #[cfg(test)]
  pub fn program(&self) -> &str {
    &self.program
  }

  #[cfg(test)]
  pub fn prefix(&self) -> &[String] {
    &self.prefix
  }

  /// Prefix + extra args, trimmed, blank tokens dropped
  pub fn full_args(&self, args: &[String]) -> Vec<String> {
    self
      .prefix
      .iter()
      .chain(args.iter())
      .map(|arg| arg.trim())
      .filter(|arg| !arg.is_empty())
      .map(str::to_string)
      .collect()
  }
}

impl CommandRunner for CommandWrapper {
  fn run(&self, args: &[String]) -> AffectedResult<Vec<String>> {
    let full_args = self.full_args(args);
    let command_line = self.describe(args);
    tracing::debug!(command = %command_line, cwd = %self.cwd.display(), "running");

    let output = Command::new(&self.program)
      .args(&full_args)
      .current_dir(&self.cwd)
      .stdin(Stdio::null())
      .output()
      .map_err(|e| {
        AffectedError::Tool(ToolError::Spawn {
          command: command_line.clone(),
          reason: e.to_string(),
        })
      })?;

    if !output.status.success() {
      return Err(AffectedError::Tool(ToolError::CommandFailed {
        command: command_line,
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    let lines = split_lines(&String::from_utf8_lossy(&output.stdout));
    for line in &lines {
      tracing::debug!(target: "nx_affected::nx::output", "{}", line);
    }

    Ok(lines)
  }

  fn describe(&self, args: &[String]) -> String {
    std::iter::once(self.program.clone())
      .chain(self.full_args(args))
      .collect::<Vec<_>>()
      .join(" ")
  }
}

/// Split captured stdout into trimmed, non-empty lines
pub fn split_lines(stdout: &str) -> Vec<String> {
  stdout
    .lines()
    .map(|line| line.trim())
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

/// Convenience for building owned argument lists
pub fn args(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| s.to_string()).collect()
}
