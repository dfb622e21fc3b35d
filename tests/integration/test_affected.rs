//! Integration tests for dialect selection, base handling and output

use crate::helpers::{FakeNx, TestWorkspace, stdout_of};
use anyhow::Result;

const MODERN_VERSION: &str = "Nx Version:\n- Local: v19.1.0\n- Global: Not found";

fn modern(query: &str) -> FakeNx<'_> {
  FakeNx {
    version: MODERN_VERSION,
    query,
  }
}

#[test]
fn test_modern_without_base_lists_all_apps() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager("npm", &modern(r#"["app-a","app-b"]"#), "10.0.0")?;

  let output = ws.run(&["--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\napp-b\n");

  let calls = ws.calls()?;
  assert_eq!(
    calls,
    vec![
      "npm run nx -- --version".to_string(),
      "npm run nx -- show projects --type app --json".to_string(),
    ]
  );

  Ok(())
}

#[test]
fn test_modern_with_base_queries_affected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  let base = ws.commit("Add lock file")?;
  ws.write("apps/app-a/main.ts", "export {}")?;
  ws.commit("Touch app-a")?;
  ws.install_manager("npm", &modern(r#"["app-a"]"#), "10.0.0")?;

  let output = ws.run(&["--base", &base, "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\n");

  let expected = format!(
    "npm run nx -- show projects --type app --json --affected --base={} --head=HEAD",
    base
  );
  assert!(ws.calls()?.contains(&expected), "calls: {:?}", ws.calls()?);

  Ok(())
}

#[test]
fn test_unknown_explicit_base_is_passed_through() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager("npm", &modern(r#"["app-a"]"#), "10.0.0")?;

  let missing = "0123456789abcdef0123456789abcdef01234567";
  let output = ws.run(&["--base", missing, "--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-a\n");

  let expected = format!(
    "npm run nx -- show projects --type app --json --affected --base={} --head=HEAD",
    missing
  );
  assert!(ws.calls()?.contains(&expected), "calls: {:?}", ws.calls()?);

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("not found locally"), "stderr: {}", stderr);

  Ok(())
}

#[test]
fn test_legacy_dialect_with_yarn() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("yarn.lock", "")?;
  ws.install_manager(
    "yarn",
    &FakeNx {
      version: "12.3.4",
      query: "$ nx affected:apps --plain --all\napp-b app-a\nDone in 0.52s.",
    },
    "1.22.19",
  )?;

  let output = ws.run(&["--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "app-b\napp-a\n");

  assert_eq!(
    ws.calls()?,
    vec![
      "yarn nx --version".to_string(),
      "yarn nx affected:apps --plain --all".to_string(),
    ]
  );

  Ok(())
}

#[test]
fn test_legacy_nothing_affected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("yarn.lock", "")?;
  let base = ws.commit("Add lock file")?;
  ws.install_manager(
    "yarn",
    &FakeNx {
      version: "15.8.9",
      query: "$ nx affected:apps --plain\nDone in 0.31s.",
    },
    "1.22.19",
  )?;

  let output = ws.run(&["--base", &base])?;
  let stdout = stdout_of(&output)?;
  assert!(stdout.contains("Affected applications: 0"), "stdout: {}", stdout);

  Ok(())
}

#[test]
fn test_modern_output_with_trailing_footer() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("yarn.lock", "")?;
  ws.install_manager(
    "yarn",
    &modern("$ nx show projects --type app --json\n[\"web\",\"admin\"]\nDone in 1.02s."),
    "1.22.19",
  )?;

  let output = ws.run(&["--format", "names-only"])?;
  assert_eq!(stdout_of(&output)?, "web\nadmin\n");

  Ok(())
}

#[test]
fn test_pnpm_separator_depends_on_pnpm_version() -> Result<()> {
  for (pnpm_version, expected) in [
    ("6.35.1", "pnpm run nx -- show projects --type app --json"),
    ("8.15.4", "pnpm run nx show projects --type app --json"),
  ] {
    let ws = TestWorkspace::new()?;
    ws.write("pnpm-lock.yaml", "lockfileVersion: '6.0'")?;
    ws.install_manager("pnpm", &modern(r#"["app-a"]"#), pnpm_version)?;

    let output = ws.run(&["--format", "names-only"])?;
    assert_eq!(stdout_of(&output)?, "app-a\n");

    let calls = ws.calls()?;
    assert_eq!(calls.first().map(String::as_str), Some("pnpm --version"));
    assert!(calls.contains(&expected.to_string()), "calls: {:?}", calls);
  }

  Ok(())
}

#[test]
fn test_json_format() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager("npm", &modern(r#"["app-a","app-b"]"#), "10.0.0")?;

  let output = ws.run(&["--format", "json"])?;
  let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)?)?;

  assert_eq!(value["affected"], serde_json::json!(["app-a", "app-b"]));
  assert_eq!(value["affectedString"], "app-a,app-b");
  assert_eq!(value["count"], 2);

  Ok(())
}

#[test]
fn test_github_step_outputs() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager("npm", &modern(r#"["app-a","app-b"]"#), "10.0.0")?;

  let output_file = ws.path.join("step-output");
  std::fs::write(&output_file, "earlier=1\n")?;
  let output_env = output_file.display().to_string();

  let output = ws.run_with_env(&["--format", "names-only"], &[("GITHUB_OUTPUT", &output_env)])?;
  stdout_of(&output)?;

  let content = std::fs::read_to_string(&output_file)?;
  assert_eq!(
    content,
    "earlier=1\naffected=[\"app-a\",\"app-b\"]\naffectedString=app-a,app-b\n"
  );

  Ok(())
}

#[test]
fn test_history_skipped_without_token() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("package-lock.json", "{}")?;
  ws.install_manager("npm", &modern(r#"["app-a"]"#), "10.0.0")?;

  // No token: the lookup never happens, so the unreachable endpoint is harmless
  let output = ws.run(&[
    "--workflow-id",
    "ci.yml",
    "--branch",
    "main",
    "--repository",
    "acme/monorepo",
    "--api-url",
    "http://127.0.0.1:9",
    "--format",
    "names-only",
  ])?;
  assert_eq!(stdout_of(&output)?, "app-a\n");

  Ok(())
}
