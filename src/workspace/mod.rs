//! Workspace metadata: project manifests and tag filtering

pub mod manifest;
pub mod tags;

pub use tags::filter_by_tags;
