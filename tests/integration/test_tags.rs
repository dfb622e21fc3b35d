//! Integration tests for tag filtering against workspace manifests

use crate::helpers::{FakeNx, TestWorkspace, stdout_of};
use anyhow::Result;

const ALL_APPS: &str = r#"["app-a","app-b","app-c"]"#;

fn workspace_with_apps() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager(
    "npm",
    &FakeNx {
      version: "Nx Version:\n- Local: v19.1.0\n- Global: Not found",
      query: ALL_APPS,
    },
    "10.0.0",
  )?;
  Ok(ws)
}

fn consolidated_v2(ws: &TestWorkspace) -> Result<()> {
  ws.write(
    "workspace.json",
    r#"{
  "version": 2,
  "projects": {
    "app-a": { "projectType": "application", "root": "apps/app-a", "tags": ["team-x", "web"] },
    "app-b": "apps/app-b",
    "app-c": { "projectType": "application", "root": "apps/app-c", "tags": ["team-x", "legacy"] }
  }
}
"#,
  )?;
  ws.write(
    "apps/app-b/project.json",
    r#"{ "name": "app-b", "projectType": "application", "tags": ["team-y", "web"] }"#,
  )
}

#[test]
fn test_include_tag() -> Result<()> {
  let ws = workspace_with_apps()?;
  consolidated_v2(&ws)?;

  let output = ws.run(&["--tag", "team-x", "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\napp-c\n");

  Ok(())
}

#[test]
fn test_include_and_exclude_tags() -> Result<()> {
  let ws = workspace_with_apps()?;
  consolidated_v2(&ws)?;

  let output = ws.run(&["--tag", "team-x,-:legacy", "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\n");

  Ok(())
}

#[test]
fn test_tags_from_referenced_project_file() -> Result<()> {
  let ws = workspace_with_apps()?;
  consolidated_v2(&ws)?;

  let output = ws.run(&["--tag", "web", "--tag", "team-y", "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-b\n");

  Ok(())
}

#[test]
fn test_exclude_only() -> Result<()> {
  let ws = workspace_with_apps()?;
  consolidated_v2(&ws)?;

  let output = ws.run(&["--tag", "-:web", "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-c\n");

  Ok(())
}

#[test]
fn test_project_json_scan() -> Result<()> {
  let ws = workspace_with_apps()?;
  ws.write(
    "apps/a/project.json",
    r#"{ "name": "app-a", "projectType": "application", "tags": ["scope:shop"] }"#,
  )?;
  ws.write(
    "apps/c/project.json",
    r#"{ "name": "app-c", "projectType": "application", "tags": ["scope:admin"] }"#,
  )?;
  ws.write(
    "libs/ui/project.json",
    r#"{ "name": "ui", "projectType": "library", "tags": ["scope:shop"] }"#,
  )?;
  ws.write(
    "node_modules/some-pkg/project.json",
    r#"{ "name": "app-b", "projectType": "application", "tags": ["scope:shop"] }"#,
  )?;

  let output = ws.run(&["--tag", "scope:shop", "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\n");

  Ok(())
}

#[test]
fn test_unsupported_workspace_version() -> Result<()> {
  let ws = workspace_with_apps()?;
  ws.write(
    "workspace.json",
    r#"{ "version": 1, "projects": { "app-a": { "projectType": "application" } } }"#,
  )?;

  let output = ws.run(&["--tag", "team-x"])?;
  assert_eq!(output.status.code(), Some(3));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(
    stderr.contains("Unsupported workspace version for tag filtering"),
    "stderr: {}",
    stderr
  );

  Ok(())
}

#[test]
fn test_unsupported_workspace_ignored_without_tags() -> Result<()> {
  let ws = workspace_with_apps()?;
  ws.write("angular.json", r#"{ "projects": {} }"#)?;

  let output = ws.run(&["--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\napp-b\napp-c\n");

  Ok(())
}
