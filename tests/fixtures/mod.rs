//! Test fixtures
//!
//! `rsb_tree/` is a small RSB top directory:
//! - `config/6/` and `config/test/` descriptors, each with a `configs.ini`
//! - `config/tools.bset` at the configuration root, also in the catalog
//! - `pkg/rpm.spec.in` and `pkg/spec-params.ini` for packaging
//! - `rsb-pkg.toml` setting the prefix, the revision and the catalog

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use rsb_pkg::config::{BuildParams, EffectiveParams};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Path to the pristine fixture tree
pub fn rsb_tree_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/rsb_tree")
}

/// Copy of the fixture tree in a temporary directory.
///
/// Materialization creates directories under the top directory, so tests
/// never run against the checked-in tree.
pub fn rsb_tree() -> TempDir {
    let source = rsb_tree_path();
    let top = TempDir::new().unwrap();

    for entry in WalkDir::new(&source) {
        let entry = entry.unwrap();
        let rel = entry.path().strip_prefix(&source).unwrap();
        let dest = top.path().join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }

    top
}

/// Write `contents` to `rel` under `top`, creating parent directories.
pub fn write(top: &Path, rel: &str, contents: &str) {
    let path = top.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Parameters for `top` with CLI-style overrides applied
pub fn params(top: &Path, cli: serde_json::Value) -> BuildParams {
    EffectiveParams::build(top, None, Some(cli)).unwrap().params
}

/// Ids of a list of entries
pub fn ids(entries: &[rsb_pkg::BuildsetEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.id.as_str()).collect()
}
