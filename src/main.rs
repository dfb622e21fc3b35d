mod commands;
mod core;
mod history;
mod nx;
mod workspace;

use clap::Parser;
use crate::core::error::{AffectedError, print_error};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Find the Nx applications affected since the last successful CI build
#[derive(Parser)]
#[command(name = "nx-affected")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Base commit to compare against (default: last successful build, else all apps).
  /// Passed to nx as given, even when the local clone lacks it
  #[arg(long)]
  base: Option<String>,

  /// Tag filter; repeat or comma-separate. Prefix with `-:` to exclude a tag
  #[arg(long = "tag", value_delimiter = ',', allow_hyphen_values = true)]
  tags: Vec<String>,

  /// Output format: text (default), json, names-only
  #[arg(long, default_value = "text")]
  format: String,

  /// Workspace root (default: current directory)
  #[arg(long)]
  workspace: Option<PathBuf>,

  /// Token for the build history lookup
  #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
  github_token: Option<String>,

  /// Repository as owner/repo
  #[arg(long, env = "GITHUB_REPOSITORY")]
  repository: Option<String>,

  /// Workflow file name or id whose successful runs define the base
  #[arg(long)]
  workflow_id: Option<String>,

  /// Branch whose successful runs define the base
  #[arg(long)]
  branch: Option<String>,

  /// GitHub REST endpoint
  #[arg(long, env = "GITHUB_API_URL")]
  api_url: Option<String>,

  /// File receiving step outputs (affected, affectedString)
  #[arg(long, env = "GITHUB_OUTPUT")]
  github_output: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,

  /// Log level: trace, debug, info, warn, error
  #[arg(long, env = "NX_AFFECTED_LOG")]
  log_level: Option<String>,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn init_logging(cli: &Cli) {
  let level = match cli.log_level.as_deref() {
    Some(level) => parse_level(level),
    None if cli.verbose => Level::DEBUG,
    None => Level::INFO,
  };

  // RUST_LOG wins when set
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("nx_affected={}", level)));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
    .init();
}

fn parse_level(level: &str) -> Level {
  match level.to_lowercase().as_str() {
    "trace" => Level::TRACE,
    "debug" => Level::DEBUG,
    "info" => Level::INFO,
    "warn" => Level::WARN,
    "error" => Level::ERROR,
    _ => {
      eprintln!(
        "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
        level
      );
      Level::INFO
    }
  }
}

fn main() {
  let cli = Cli::parse();
  init_logging(&cli);

  let workspace_root = match cli.workspace.clone() {
    Some(dir) => dir,
    None => match std::env::current_dir() {
      Ok(dir) => dir,
      Err(e) => {
        eprintln!("Error: Failed to get current directory: {}", e);
        std::process::exit(1);
      }
    },
  };

  let ctx = match crate::core::context::WorkspaceContext::build(&workspace_root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let args = commands::AffectedArgs {
    base: cli.base,
    tags: cli.tags,
    format: cli.format,
    github_output: cli.github_output,
    history: commands::HistorySettings {
      token: cli.github_token,
      repository: cli.repository,
      workflow_id: cli.workflow_id,
      branch: cli.branch,
      api_url: cli.api_url,
    },
  };

  if let Err(err) = commands::run_affected(&ctx, args) {
    handle_error(err);
  }
}

fn handle_error(err: AffectedError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
