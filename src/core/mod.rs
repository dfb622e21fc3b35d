//! Core building blocks shared by every stage of a run
//!
//! - **config**: nx-affected.toml parsing and validation
//! - **context**: workspace root + configuration, built once in main
//! - **error**: error categories with contextual help and exit codes
//! - **vcs**: local git checks (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
