//! Version-bound nx query dialects
//!
//! Each dialect pairs the arguments for "which apps are affected" with a
//! parser for what that nx generation prints back.

use crate::core::error::{AffectedError, AffectedResult, ParseError};
use semver::Version;
use serde_json::Value;

/// How to ask nx for affected apps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  /// `nx show projects --type app --json [--affected --base --head]`
  Modern,
  /// `nx affected:apps --plain [--base --head | --all]`
  Legacy,
}

impl Dialect {
  /// Dialects in selection order
  pub const ALL: [Dialect; 2] = [Dialect::Modern, Dialect::Legacy];

  /// Whether this dialect applies to the given nx version.
  /// An unknown version only matches the legacy dialect.
  pub fn matches(&self, version: Option<&Version>, modern_threshold: &Version) -> bool {
    match self {
      Dialect::Modern => version.is_some_and(|v| v >= modern_threshold),
      Dialect::Legacy => true,
    }
  }

  /// First dialect whose predicate holds
  pub fn select(version: Option<&Version>, modern_threshold: &Version) -> Dialect {
    Self::ALL
      .into_iter()
      .find(|dialect| dialect.matches(version, modern_threshold))
      .unwrap_or(Dialect::Legacy)
  }

  pub fn name(&self) -> &'static str {
    match self {
      Dialect::Modern => "show-projects",
      Dialect::Legacy => "affected:apps",
    }
  }

  /// Arguments for the query
  pub fn query_args(&self, base: Option<&str>) -> Vec<String> {
    let mut args: Vec<String> = match self {
      Dialect::Modern => vec!["show", "projects", "--type", "app", "--json"],
      Dialect::Legacy => vec!["affected:apps", "--plain"],
    }
    .into_iter()
    .map(str::to_string)
    .collect();

    match (self, base) {
      (Dialect::Modern, Some(sha)) => {
        args.push("--affected".to_string());
        args.push(format!("--base={}", sha));
        args.push("--head=HEAD".to_string());
      }
      (Dialect::Modern, None) => {}
      (Dialect::Legacy, Some(sha)) => {
        args.push(format!("--base={}", sha));
        args.push("--head=HEAD".to_string());
      }
      (Dialect::Legacy, None) => args.push("--all".to_string()),
    }

    args
  }

  /// Extract app names from the tool output
  pub fn parse(&self, lines: &[String], command: &str) -> AffectedResult<Vec<String>> {
    match self {
      Dialect::Modern => parse_json_payload(lines, command),
      Dialect::Legacy => Ok(parse_plain_payload(lines)),
    }
  }
}

/// Everything from the first line starting with `[` or `{` is JSON.
/// An object carries the list under `projects`; an array is the list itself.
/// Only the first JSON value is read, so package-manager footers such as
/// yarn's `Done in 1.2s.` after the document are ignored.
pub fn parse_json_payload(lines: &[String], command: &str) -> AffectedResult<Vec<String>> {
  let start = lines
    .iter()
    .position(|line| {
      let line = line.trim_start();
      line.starts_with('[') || line.starts_with('{')
    })
    .ok_or_else(|| {
      AffectedError::Parse(ParseError::MissingPayload {
        command: command.to_string(),
      })
    })?;

  let invalid = |reason: String| {
    AffectedError::Parse(ParseError::InvalidPayload {
      command: command.to_string(),
      reason,
    })
  };

  let payload = lines[start..].join("\n");
  let value: Value = serde_json::Deserializer::from_str(&payload)
    .into_iter::<Value>()
    .next()
    .ok_or_else(|| invalid("empty payload".to_string()))?
    .map_err(|e| invalid(e.to_string()))?;

  let list = match value {
    Value::Array(items) => items,
    Value::Object(mut map) => match map.remove("projects") {
      Some(Value::Array(items)) => items,
      Some(_) => return Err(invalid("\"projects\" is not an array".to_string())),
      None => return Err(invalid("object has no \"projects\" field".to_string())),
    },
    _ => return Err(invalid("expected an array or an object".to_string())),
  };

  list
    .into_iter()
    .map(|item| match item {
      Value::String(name) => Ok(name),
      other => Err(invalid(format!("project name is not a string: {}", other))),
    })
    .collect()
}

/// Free-form `affected:apps --plain` output.
///
/// The payload is the single line after the echoed command. It is accepted
/// only when a `Done in` line directly follows it or no `Done in` line appears
/// anywhere in the output. Anything else is treated as "no affected apps".
pub fn parse_plain_payload(lines: &[String]) -> Vec<String> {
  let lines: Vec<&str> = lines.iter().map(|line| line.trim()).filter(|line| !line.is_empty()).collect();

  let Some(echo) = lines
    .iter()
    .position(|line| line.contains("nx") && line.contains("affected:apps"))
  else {
    return Vec::new();
  };

  let Some(payload) = lines.get(echo + 1) else {
    return Vec::new();
  };

  if payload.starts_with("Done in") {
    return Vec::new();
  }

  let done = lines.iter().position(|line| line.starts_with("Done in"));
  if done.is_some() && done != Some(echo + 2) {
    return Vec::new();
  }

  payload.split_whitespace().map(str::to_string).collect()
}
