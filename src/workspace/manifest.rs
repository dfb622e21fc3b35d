//! Workspace manifests: where project tags live
//!
//! Nx workspaces describe projects in one of two layouts:
//!
//! - a consolidated document (`workspace.json`, or `angular.json` in older
//!   Angular-based workspaces) with a `version` field. Version 2 carries
//!   `tags` per project, either inline or in a `project.json` referenced by
//!   path. Unversioned and version 1 documents keep tags elsewhere and are
//!   not supported for tag lookups.
//! - one `project.json` per project, discovered by walking the workspace.
//!
//! Both are exposed through [`ManifestSource`].

use crate::core::error::{AffectedError, AffectedResult, WorkspaceError};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Consolidated manifests, in probe order
pub const CONSOLIDATED_MANIFESTS: [&str; 2] = ["workspace.json", "angular.json"];

/// Per-project manifest file name
pub const PROJECT_MANIFEST: &str = "project.json";

/// First consolidated version that carries per-project tags
const TAGGED_WORKSPACE_VERSION: u64 = 2;

/// Directories never scanned for project manifests
const SKIPPED_DIRS: [&str; 6] = ["node_modules", "dist", "tmp", ".nx", ".git", ".angular"];

/// Tag lookup over a resolved workspace manifest
pub trait ManifestSource {
  /// Tags declared for `app`; empty when the app is unknown
  fn lookup_tags(&self, app: &str) -> AffectedResult<Vec<String>>;

  /// Short description for logs
  fn describe(&self) -> String;
}

/// Project fields shared by inline entries and project.json files
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub project_type: Option<String>,
  #[serde(default)]
  pub root: Option<String>,
  #[serde(default)]
  pub tags: Vec<String>,
}

impl ProjectConfig {
  pub fn is_application(&self) -> bool {
    self.project_type.as_deref() == Some("application")
  }
}

/// A project in a consolidated document: inline config or a path to its directory
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProjectEntry {
  Path(String),
  Inline(ProjectConfig),
}

#[derive(Debug, Deserialize)]
struct ConsolidatedDocument {
  #[serde(default)]
  version: Option<u64>,
  #[serde(default)]
  projects: HashMap<String, ProjectEntry>,
}

/// `workspace.json` / `angular.json`
#[derive(Debug)]
pub struct ConsolidatedManifest {
  root: PathBuf,
  path: PathBuf,
  version: Option<u64>,
  projects: HashMap<String, ProjectEntry>,
}

impl ConsolidatedManifest {
  pub fn load(root: &Path, path: &Path) -> AffectedResult<Self> {
    let document: ConsolidatedDocument = read_json(path)?;
    Ok(Self {
      root: root.to_path_buf(),
      path: path.to_path_buf(),
      version: document.version,
      projects: document.projects,
    })
  }

  fn supports_tags(&self) -> bool {
    self.version.is_some_and(|v| v >= TAGGED_WORKSPACE_VERSION)
  }
}

impl ManifestSource for ConsolidatedManifest {
  fn lookup_tags(&self, app: &str) -> AffectedResult<Vec<String>> {
    if !self.supports_tags() {
      return Err(AffectedError::Workspace(WorkspaceError::UnsupportedVersion {
        path: self.path.clone(),
        version: self.version,
      }));
    }

    match self.projects.get(app) {
      None => Ok(Vec::new()),
      Some(ProjectEntry::Inline(config)) => Ok(config.tags.clone()),
      Some(ProjectEntry::Path(dir)) => {
        let project: ProjectConfig = read_json(&self.root.join(dir).join(PROJECT_MANIFEST))?;
        Ok(project.tags)
      }
    }
  }

  fn describe(&self) -> String {
    match self.version {
      Some(v) => format!("{} (version {})", self.path.display(), v),
      None => format!("{} (unversioned)", self.path.display()),
    }
  }
}

/// Index of application `project.json` files keyed by declared name
#[derive(Debug, Default)]
pub struct ProjectIndex {
  projects: HashMap<String, IndexedProject>,
}

#[derive(Debug)]
struct IndexedProject {
  manifest: PathBuf,
  tags: Vec<String>,
}

impl ProjectIndex {
  /// Walk the workspace for `project.json` files (gitignore-aware)
  pub fn scan(root: &Path) -> AffectedResult<Self> {
    let walker = WalkBuilder::new(root)
      .hidden(false)
      .require_git(false)
      .sort_by_file_name(|a, b| a.cmp(b))
      .filter_entry(|entry| {
        entry
          .file_name()
          .to_str()
          .is_none_or(|name| !SKIPPED_DIRS.contains(&name))
      })
      .build();

    let mut index = Self::default();
    for entry in walker {
      let entry = entry?;
      if entry.file_name() != PROJECT_MANIFEST || !entry.file_type().is_some_and(|t| t.is_file()) {
        continue;
      }

      let project: ProjectConfig = match read_json(entry.path()) {
        Ok(project) => project,
        Err(err) => {
          tracing::warn!(path = %entry.path().display(), "skipping unreadable project manifest: {}", err);
          continue;
        }
      };
      index.insert(entry.path(), project);
    }

    tracing::debug!(count = index.len(), "indexed application manifests");
    Ok(index)
  }

  fn insert(&mut self, manifest: &Path, project: ProjectConfig) {
    if !project.is_application() {
      return;
    }
    let Some(name) = project.name else {
      tracing::debug!(path = %manifest.display(), "project manifest without a name");
      return;
    };

    if let Some(existing) = self.projects.get(&name) {
      tracing::warn!(
        project = %name,
        kept = %existing.manifest.display(),
        ignored = %manifest.display(),
        "duplicate project name"
      );
      return;
    }

    self.projects.insert(
      name,
      IndexedProject {
        manifest: manifest.to_path_buf(),
        tags: project.tags,
      },
    );
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  #[cfg(test)]
  pub fn contains(&self, app: &str) -> bool {
    self.projects.contains_key(app)
  }
}

impl ManifestSource for ProjectIndex {
  fn lookup_tags(&self, app: &str) -> AffectedResult<Vec<String>> {
    Ok(self.projects.get(app).map(|p| p.tags.clone()).unwrap_or_default())
  }

  fn describe(&self) -> String {
    format!("{} project.json application manifests", self.projects.len())
  }
}

/// Resolve the workspace manifest: consolidated document if present, else a project scan
pub fn resolve_manifest(root: &Path) -> AffectedResult<Box<dyn ManifestSource>> {
  for file in CONSOLIDATED_MANIFESTS {
    let path = root.join(file);
    if path.is_file() {
      let manifest = ConsolidatedManifest::load(root, &path)?;
      tracing::info!(manifest = %manifest.describe(), "using consolidated workspace manifest");
      return Ok(Box::new(manifest));
    }
  }

  let index = ProjectIndex::scan(root)?;
  tracing::info!(manifest = %index.describe(), "using per-project manifests");
  Ok(Box::new(index))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AffectedResult<T> {
  let invalid = |reason: String| {
    AffectedError::Workspace(WorkspaceError::InvalidManifest {
      path: path.to_path_buf(),
      reason,
    })
  };
  let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
  serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
}
