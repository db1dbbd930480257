//! Configuration tree discovery
//!
//! Walks the configuration root and collects:
//! - every `*.bset` descriptor, as a buildset id relative to the root
//! - every `configs.ini` override file, with its directory scope
//!
//! Both lists are returned sorted. A missing root is not an error; it just
//! yields nothing.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::catalog::BuildsetId;

/// Extension of buildset descriptor files
pub const BSET_EXTENSION: &str = "bset";

/// File name of per-directory override files
pub const OVERRIDE_FILE_NAME: &str = "configs.ini";

/// Errors for discovery
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Path is not within configuration root: {0}")]
    PathNotInRoot(PathBuf),
}

/// A discovered override file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideFile {
    /// Path under the configuration root
    pub path: PathBuf,

    /// Directory relative to the configuration root, `/`-separated, "" at
    /// the root
    pub scope: String,
}

/// Everything found under one configuration root
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Buildset ids, sorted
    pub buildsets: Vec<BuildsetId>,

    /// Override files, sorted by path
    pub override_files: Vec<OverrideFile>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.buildsets.is_empty() && self.override_files.is_empty()
    }
}

/// Walk `root` and discover descriptors and override files.
pub fn scan(root: &Path) -> Result<Discovery, ScanError> {
    let mut discovery = Discovery::default();

    if !root.is_dir() {
        tracing::debug!(root = %root.display(), "configuration root missing, nothing to discover");
        return Ok(discovery);
    }

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        // Symlinks count only when they resolve to a regular file
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }

        let path = entry.path();
        let rel_path = path
            .strip_prefix(root)
            .map_err(|_| ScanError::PathNotInRoot(path.to_path_buf()))?;

        if entry.file_name() == OVERRIDE_FILE_NAME {
            let Some(scope) = rel_path.parent().and_then(slash_path) else {
                tracing::warn!(path = %path.display(), "skipping override file with non UTF-8 path");
                continue;
            };
            discovery.override_files.push(OverrideFile {
                path: path.to_path_buf(),
                scope,
            });
        } else if rel_path.extension().is_some_and(|ext| ext == BSET_EXTENSION) {
            let Some(id) = slash_path(&rel_path.with_extension("")) else {
                tracing::warn!(path = %path.display(), "skipping descriptor with non UTF-8 path");
                continue;
            };
            discovery.buildsets.push(BuildsetId::new(id));
        }
    }

    discovery.buildsets.sort();
    discovery.buildsets.dedup();
    discovery.override_files.sort_by(|a, b| a.path.cmp(&b.path));

    tracing::debug!(
        root = %root.display(),
        buildsets = discovery.buildsets.len(),
        override_files = discovery.override_files.len(),
        "discovery complete"
    );

    Ok(discovery)
}

/// Join the normal components of a relative path with `/`.
fn slash_path(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_str()?);
        }
    }
    Some(parts.join("/"))
}
