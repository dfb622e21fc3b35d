//! CLI commands for nx-affected
//!
//! - **affected**: resolve, filter and publish the affected Nx applications
//!
//! Commands accept `&WorkspaceContext` so the workspace root and configuration
//! are loaded once in main.

pub mod affected;

pub use affected::{AffectedArgs, HistorySettings, run_affected};
