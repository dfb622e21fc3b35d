//! Driving the nx CLI
//!
//! - **command**: process invocation with a fixed argument prefix
//! - **locate**: package-manager detection and the nx command wrapper
//! - **version**: `nx --version` parsing and version comparison
//! - **dialect**: version-bound query arguments and output parsers
//! - **affected**: dialect dispatch producing the affected app set

pub mod affected;
pub mod command;
pub mod dialect;
pub mod locate;
pub mod version;

pub use affected::{AffectedSet, DialectPolicy, get_affected};
pub use command::{CommandRunner, CommandWrapper};
pub use locate::locate;
