//! Job descriptor materialization
//!
//! Turns one selected, merged buildset into everything the set builder and
//! the packaging backends need: file locations and argument vectors for a
//! real (or simulated) run and for a package-only run.
//!
//! Layout under the top directory, for buildset `test/aarch64-config`:
//! - descriptor: `<config_root>/test/aarch64-config.bset`
//! - log:        `<build_root>/test/aarch64-config.txt`
//! - work dir:   `<build_root>/test/aarch64-config/`
//! - archive:    `<archive_root>/aarch64-config.tar.bz2`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::catalog::{BuildsetEntry, BuildsetId};
use crate::config::{BuildParams, OverrideValue};
use crate::scan::BSET_EXTENSION;

/// Builder flag: install prefix
pub const FLAG_PREFIX: &str = "--prefix=";

/// Builder flag: emit the build set as a tar file
pub const FLAG_TAR_FILE: &str = "--bset-tar-file";

/// Builder flag: trace output
pub const FLAG_TRACE: &str = "--trace";

/// Builder flag: log file
pub const FLAG_LOG: &str = "--log=";

/// Builder flag: do not install into the prefix
pub const FLAG_NO_INSTALL: &str = "--no-install";

/// Builder flag: simulate
pub const FLAG_DRY_RUN: &str = "--dry-run";

/// Archive suffix
pub const ARCHIVE_SUFFIX: &str = ".tar.bz2";

/// Log file suffix
pub const LOG_SUFFIX: &str = ".txt";

/// Job materialization errors
#[derive(Debug, Error)]
pub enum JobError {
    #[error("buildset not found: {buildset} ({})", path.display())]
    BuildsetNotFound { buildset: BuildsetId, path: PathBuf },

    #[error("failed to create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fully resolved unit of work for one buildset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Buildset id
    pub buildset: BuildsetId,

    /// Final path segment of the buildset id
    pub name: String,

    /// Absolute path of the `.bset` descriptor
    pub descriptor_path: PathBuf,

    /// Absolute path of the builder log
    pub log_path: PathBuf,

    /// Directory holding archives
    pub archive_dir: PathBuf,

    /// Absolute path of the `.tar.bz2` the builder emits
    pub archive_path: PathBuf,

    /// Per-buildset working directory
    pub work_dir: PathBuf,

    /// Entry dry-run OR global dry-run
    pub dry_run: bool,

    /// Advisory flag carried from the entry
    pub good: bool,

    /// Set builder command
    pub command: String,

    /// Flags common to every invocation
    pub base_args: Vec<String>,

    /// Flags added for a real or simulated run
    pub extra_args: Vec<String>,

    /// `base_args + extra_args + [buildset]`
    pub run_args: Vec<String>,

    /// `base_args + ["--no-install", buildset]`
    pub package_args: Vec<String>,

    /// Override keys carried from the entry
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", skip_deserializing)]
    pub overrides: BTreeMap<String, OverrideValue>,
}

impl JobDescriptor {
    /// Full command line for a real or simulated run
    pub fn run_command(&self) -> Vec<String> {
        std::iter::once(self.command.clone())
            .chain(self.run_args.iter().cloned())
            .collect()
    }

    /// Full command line for a package-only run
    pub fn package_command(&self) -> Vec<String> {
        std::iter::once(self.command.clone())
            .chain(self.package_args.iter().cloned())
            .collect()
    }
}

/// Relative descriptor path of a buildset under the configuration root
pub fn descriptor_rel_path(config_root: &Path, id: &BuildsetId) -> PathBuf {
    config_root.join(format!("{}.{}", id, BSET_EXTENSION))
}

/// Materialize one buildset.
///
/// Fails if the descriptor file does not exist. Creates the archive
/// directory, the work directory and the log directory; repeated calls with
/// the same inputs return equal descriptors.
pub fn materialize(entry: &BuildsetEntry, params: &BuildParams) -> Result<JobDescriptor, JobError> {
    let id = &entry.id;
    let name = id.name().to_string();

    let descriptor_path = params.top.join(descriptor_rel_path(&params.config_root, id));
    if !descriptor_path.is_file() {
        return Err(JobError::BuildsetNotFound {
            buildset: id.clone(),
            path: descriptor_path,
        });
    }

    let log_rel = params.build_root.join(format!("{}{}", id, LOG_SUFFIX));
    let log_path = params.top.join(&log_rel);
    let work_dir = params.build_dir().join(id.as_str());
    let archive_dir = params.archive_dir();
    let archive_path = archive_dir.join(format!("{}{}", name, ARCHIVE_SUFFIX));

    for dir in [Some(archive_dir.as_path()), Some(work_dir.as_path()), log_path.parent()]
        .into_iter()
        .flatten()
    {
        create_dir(dir)?;
    }

    let dry_run = entry.dry_run || params.dry_run;

    let mut base_args = vec![
        format!("{}{}", FLAG_PREFIX, params.prefix),
        FLAG_TAR_FILE.to_string(),
        FLAG_TRACE.to_string(),
        format!("{}{}", FLAG_LOG, log_rel.display()),
    ];
    base_args.extend(params.builder_opts.iter().cloned());

    let mut extra_args = Vec::new();
    if params.no_install {
        extra_args.push(FLAG_NO_INSTALL.to_string());
    }
    if dry_run {
        extra_args.push(FLAG_DRY_RUN.to_string());
    }

    let run_args: Vec<String> = base_args
        .iter()
        .chain(extra_args.iter())
        .cloned()
        .chain(std::iter::once(id.to_string()))
        .collect();

    let package_args: Vec<String> = base_args
        .iter()
        .cloned()
        .chain([FLAG_NO_INSTALL.to_string(), id.to_string()])
        .collect();

    tracing::debug!(buildset = %id, dry_run, "materialized job");

    Ok(JobDescriptor {
        buildset: id.clone(),
        name,
        descriptor_path,
        log_path,
        archive_dir,
        archive_path,
        work_dir,
        dry_run,
        good: entry.good,
        command: params.builder.clone(),
        base_args,
        extra_args,
        run_args,
        package_args,
        overrides: entry.overrides.clone(),
    })
}

fn create_dir(path: &Path) -> Result<(), JobError> {
    fs::create_dir_all(path).map_err(|source| JobError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveParams;
    use tempfile::TempDir;

    fn setup(cli: serde_json::Value) -> (TempDir, BuildParams) {
        let top = TempDir::new().unwrap();
        let bset = top.path().join("config/test/aarch64-config.bset");
        fs::create_dir_all(bset.parent().unwrap()).unwrap();
        fs::write(&bset, "").unwrap();
        let params = EffectiveParams::build(top.path(), None, Some(cli)).unwrap().params;
        (top, params)
    }

    #[test]
    fn test_paths() {
        let (top, params) = setup(serde_json::json!({}));
        let job = materialize(&BuildsetEntry::new("test/aarch64-config"), &params).unwrap();

        assert_eq!(job.name, "aarch64-config");
        assert_eq!(
            job.descriptor_path,
            top.path().join("config/test/aarch64-config.bset")
        );
        assert_eq!(job.log_path, top.path().join("build/test/aarch64-config.txt"));
        assert_eq!(job.work_dir, top.path().join("build/test/aarch64-config"));
        assert_eq!(job.archive_path, top.path().join("tar/aarch64-config.tar.bz2"));
        assert!(job.work_dir.is_dir());
        assert!(job.archive_dir.is_dir());
    }

    #[test]
    fn test_base_args() {
        let (_top, params) = setup(serde_json::json!({
            "prefix": "/opt/rtems/6",
            "builder_opts": ["--jobs=4"]
        }));
        let job = materialize(&BuildsetEntry::new("test/aarch64-config"), &params).unwrap();

        assert_eq!(
            job.base_args,
            vec![
                "--prefix=/opt/rtems/6",
                "--bset-tar-file",
                "--trace",
                "--log=build/test/aarch64-config.txt",
                "--jobs=4",
            ]
        );
        assert!(job.extra_args.is_empty());
        assert_eq!(job.run_args.last().map(String::as_str), Some("test/aarch64-config"));
        assert_eq!(job.run_command()[0], "source-builder/sb-set-builder");
    }

    #[test]
    fn test_dry_run_is_logical_or() {
        let (_top, params) = setup(serde_json::json!({}));
        let (_top2, global) = setup(serde_json::json!({"dry_run": true}));

        let plain = BuildsetEntry::new("test/aarch64-config");
        let forced = plain.clone().with_dry_run(true);

        assert!(!materialize(&plain, &params).unwrap().dry_run);
        assert!(materialize(&forced, &params).unwrap().dry_run);
        assert!(materialize(&plain, &global).unwrap().dry_run);
        assert!(materialize(&forced, &global).unwrap().dry_run);

        let job = materialize(&forced, &params).unwrap();
        assert!(job.run_args.contains(&FLAG_DRY_RUN.to_string()));
        assert!(!job.package_args.contains(&FLAG_DRY_RUN.to_string()));
    }

    #[test]
    fn test_no_install() {
        let (_top, params) = setup(serde_json::json!({"no_install": true, "dry_run": true}));
        let job = materialize(&BuildsetEntry::new("test/aarch64-config"), &params).unwrap();

        assert_eq!(job.extra_args, vec!["--no-install", "--dry-run"]);
        let tail: Vec<&str> = job.run_args.iter().rev().take(3).map(String::as_str).collect();
        assert_eq!(tail, vec!["test/aarch64-config", "--dry-run", "--no-install"]);

        let mut expected = job.base_args.clone();
        expected.push("--no-install".to_string());
        expected.push("test/aarch64-config".to_string());
        assert_eq!(job.package_args, expected);
        assert!(!job.package_args.contains(&FLAG_DRY_RUN.to_string()));
        let no_install = job
            .package_args
            .iter()
            .filter(|arg| arg.as_str() == FLAG_NO_INSTALL)
            .count();
        assert_eq!(no_install, 1);
    }

    #[test]
    fn test_package_args_always_no_install() {
        let (_top, params) = setup(serde_json::json!({}));
        let job = materialize(&BuildsetEntry::new("test/aarch64-config"), &params).unwrap();

        let mut expected = job.base_args.clone();
        expected.push("--no-install".to_string());
        expected.push("test/aarch64-config".to_string());
        assert_eq!(job.package_args, expected);
        assert!(!job.run_args.contains(&FLAG_NO_INSTALL.to_string()));
    }

    #[test]
    fn test_missing_descriptor() {
        let (_top, params) = setup(serde_json::json!({}));
        let err = materialize(&BuildsetEntry::new("test/missing"), &params).unwrap_err();

        assert!(matches!(err, JobError::BuildsetNotFound { .. }));
        assert!(err.to_string().contains("buildset not found: test/missing"));
    }

    #[test]
    fn test_idempotent() {
        let (_top, params) = setup(serde_json::json!({}));
        let entry = BuildsetEntry::new("test/aarch64-config");

        let first = materialize(&entry, &params).unwrap();
        let second = materialize(&entry, &params).unwrap();

        assert_eq!(first, second);
    }
}
