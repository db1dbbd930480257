//! Resolution pipeline
//!
//! One run goes through these steps, in order, failing fast:
//! - Compile the build filter
//! - Discover descriptors and override files under the configuration root
//! - Union the discovered ids with the catalog and apply the filter
//! - Merge every override file into the candidates
//! - Drop disabled entries and sort
//! - Materialize a job per selected buildset
//! - Hand each job to a packaging backend
//!
//! Every job is materialized before the first backend output is written, so
//! a missing descriptor leaves no partial set of generated files behind.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use rsb_ini::LoadError;
use serde::Serialize;
use thiserror::Error;

use crate::backend::{self, Backend, BackendError, PackageContext};
use crate::catalog::{BuildsetEntry, BuildsetId};
use crate::config::{apply_overrides, BuildParams, OverrideError, OverrideSource, ParamsError};
use crate::job::{materialize, JobDescriptor, JobError};
use crate::scan::{scan, ScanError};
use crate::selection::{filter_candidates, retain_enabled, BuildFilter, SelectionError};
use crate::spec::{load_spec_config, validate_spec_overrides, SpecError};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("discovery: {0}")]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("override merge: {0}")]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("{first} and {second} both generate {}", path.display())]
    OutputCollision {
        first: BuildsetId,
        second: BuildsetId,
        path: PathBuf,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Exit code: configuration error
pub const EXIT_CONFIG: i32 = 1;

/// Exit code: a required file is missing
pub const EXIT_MISSING: i32 = 2;

/// Exit code: I/O failure
pub const EXIT_IO: i32 = 3;

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Params(ParamsError::IoError(_)) => EXIT_IO,
            PipelineError::Params(_) => EXIT_CONFIG,
            PipelineError::Scan(_) => EXIT_IO,
            PipelineError::Selection(_) => EXIT_CONFIG,
            PipelineError::Override(OverrideError::Io { .. }) => EXIT_IO,
            PipelineError::Override(_) => EXIT_CONFIG,
            PipelineError::Job(JobError::BuildsetNotFound { .. }) => EXIT_MISSING,
            PipelineError::Job(JobError::CreateDir { .. }) => EXIT_IO,
            PipelineError::Spec(e) => spec_exit_code(e),
            PipelineError::Backend(BackendError::TemplateNotFound { .. }) => EXIT_MISSING,
            PipelineError::Backend(BackendError::Io { .. }) => EXIT_IO,
            PipelineError::Backend(BackendError::Spec(e)) => spec_exit_code(e),
            PipelineError::Backend(_) => EXIT_CONFIG,
            PipelineError::OutputCollision { .. } => EXIT_CONFIG,
            PipelineError::Io(_) => EXIT_IO,
            PipelineError::Serialization(_) => EXIT_CONFIG,
        }
    }
}

fn spec_exit_code(err: &SpecError) -> i32 {
    match err {
        SpecError::Load(LoadError::Io { .. }) => EXIT_IO,
        SpecError::Load(LoadError::Encoding { .. }) => EXIT_CONFIG,
        _ => EXIT_CONFIG,
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Outcome of the selection and merge steps
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// Enabled, merged entries sorted by id
    pub selected: Vec<BuildsetEntry>,

    /// Every descriptor found under the configuration root
    pub discovered: Vec<BuildsetId>,

    /// Override files read, in application order
    pub override_sources: Vec<OverrideSource>,
}

/// Select and merge the buildsets of one run.
pub fn resolve(params: &BuildParams) -> PipelineResult<Resolution> {
    let filter = BuildFilter::from_option(params.build_filter())?;

    let config_dir = params.config_dir();
    let discovery = scan(&config_dir)?;
    let catalog = params.catalog();
    if discovery.is_empty() && catalog.is_empty() {
        tracing::warn!(root = %config_dir.display(), "no buildsets discovered or catalogued");
    }
    tracing::debug!(catalog = catalog.len(), discovered = discovery.buildsets.len(), "candidates");

    let candidates = catalog.with_discovered(&discovery.buildsets);
    let candidates = filter_candidates(candidates, filter.as_ref());

    let merged = apply_overrides(candidates, &discovery.override_files, &params.revision)?;
    let selected = retain_enabled(merged.entries);

    for entry in &selected {
        tracing::info!(buildset = %entry.id, dry_run = entry.dry_run, "selected");
    }

    Ok(Resolution {
        selected,
        discovered: discovery.buildsets,
        override_sources: merged.sources,
    })
}

/// Materialize a job for every entry, stopping at the first failure.
pub fn materialize_all(
    params: &BuildParams,
    entries: &[BuildsetEntry],
) -> PipelineResult<Vec<JobDescriptor>> {
    entries
        .iter()
        .map(|entry| materialize(entry, params).map_err(PipelineError::from))
        .collect()
}

/// Validate everything a run depends on without creating any file.
///
/// Covers the filter, discovery, every override file and the spec
/// parameter inputs.
pub fn check(params: &BuildParams) -> PipelineResult<Resolution> {
    validate_spec_overrides(&params.spec_overrides)?;
    load_spec_config(params.spec_config_path().as_deref())?;
    resolve(params)
}

/// Generate backend output for every selected buildset.
///
/// `template` defaults to the backend's own template under the top
/// directory. Returns the written paths in buildset order.
pub fn package(
    params: &BuildParams,
    backend: &dyn Backend,
    template: Option<&Path>,
) -> PipelineResult<Vec<PathBuf>> {
    validate_spec_overrides(&params.spec_overrides)?;
    let spec_config = load_spec_config(params.spec_config_path().as_deref())?;

    let template_path = match template {
        Some(path) => path.to_path_buf(),
        None => params.top.join(backend.default_template()),
    };
    let template = backend::load_template(&template_path)?;

    let resolution = resolve(params)?;
    let jobs = materialize_all(params, &resolution.selected)?;

    let mut outputs: BTreeMap<PathBuf, &BuildsetId> = BTreeMap::new();
    for job in &jobs {
        let path = backend.output_path(job, params);
        if let Some(first) = outputs.insert(path.clone(), &job.buildset) {
            return Err(PipelineError::OutputCollision {
                first: first.clone(),
                second: job.buildset.clone(),
                path,
            });
        }
    }

    let ctx = PackageContext {
        params,
        template: &template,
        spec_config: spec_config.as_ref(),
    };

    let mut written = Vec::with_capacity(jobs.len());
    for job in &jobs {
        written.push(backend::generate(backend, job, &ctx)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveParams;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn params(top: &Path, cli: serde_json::Value) -> BuildParams {
        EffectiveParams::build(top, None, Some(cli)).unwrap().params
    }

    #[test]
    fn test_pipeline_error_exit_codes() {
        let missing = PipelineError::Job(JobError::BuildsetNotFound {
            buildset: "x".into(),
            path: PathBuf::from("config/x.bset"),
        });
        assert_eq!(missing.exit_code(), EXIT_MISSING);

        let filter = PipelineError::from(BuildFilter::new("(").unwrap_err());
        assert_eq!(filter.exit_code(), EXIT_CONFIG);

        let template = PipelineError::Backend(BackendError::TemplateNotFound {
            path: PathBuf::from("pkg/rpm.spec.in"),
        });
        assert_eq!(template.exit_code(), EXIT_MISSING);

        let io = PipelineError::Io(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(io.exit_code(), EXIT_IO);

        let spec = PipelineError::Spec(SpecError::InvalidOverride("x".to_string()));
        assert_eq!(spec.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn test_resolve_empty_root() {
        let top = TempDir::new().unwrap();
        let resolution = resolve(&params(top.path(), serde_json::json!({}))).unwrap();

        assert!(resolution.selected.is_empty());
        assert!(resolution.discovered.is_empty());
        assert!(resolution.override_sources.is_empty());
    }

    #[test]
    fn test_invalid_filter_fails_before_scan() {
        let top = TempDir::new().unwrap();
        let p = params(top.path(), serde_json::json!({"build_filter": "test/(aarch"}));

        let err = resolve(&p).unwrap_err();
        assert!(matches!(err, PipelineError::Selection(_)));
    }

    #[test]
    fn test_resolve_filters_and_disables() {
        let top = TempDir::new().unwrap();
        touch(top.path(), "config/test/aarch64-config.bset", "");
        touch(top.path(), "config/test/sparc-config.bset", "");
        touch(top.path(), "config/test/configs.ini", "[sparc-config]\nenabled = false\n");

        let all = resolve(&params(top.path(), serde_json::json!({}))).unwrap();
        let ids: Vec<&str> = all.selected.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["test/aarch64-config"]);
        assert_eq!(all.discovered.len(), 2);
        assert_eq!(all.override_sources.len(), 1);

        let none = resolve(&params(top.path(), serde_json::json!({"build_filter": "6/"}))).unwrap();
        assert!(none.selected.is_empty());
    }

    #[test]
    fn test_materialize_all_stops_on_missing() {
        let top = TempDir::new().unwrap();
        touch(top.path(), "config/a.bset", "");
        let p = params(top.path(), serde_json::json!({}));

        let entries = vec![BuildsetEntry::new("a"), BuildsetEntry::new("b")];
        let err = materialize_all(&p, &entries).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_MISSING);
    }

    #[test]
    fn test_check_rejects_bad_spec_override() {
        let top = TempDir::new().unwrap();
        let p = params(top.path(), serde_json::json!({"spec_overrides": ["smp"]}));

        assert!(matches!(check(&p), Err(PipelineError::Spec(_))));
    }

    #[test]
    fn test_package_missing_template() {
        let top = TempDir::new().unwrap();
        let p = params(top.path(), serde_json::json!({}));
        let rpm = backend::backend_by_name("rpm").unwrap();

        let err = package(&p, rpm.as_ref(), None).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_MISSING);
    }

    #[test]
    fn test_package_writes_nothing_when_a_descriptor_is_missing() {
        let top = TempDir::new().unwrap();
        touch(top.path(), "config/test/a.bset", "");
        touch(top.path(), "pkg/rpm.spec.in", "Name: @RSB_PKG_NAME@\n");
        touch(top.path(), "rsb-pkg.toml", "[[catalog]]\nbuildset = \"test/zz-missing\"\n");
        let p = params(top.path(), serde_json::json!({}));
        let rpm = backend::backend_by_name("rpm").unwrap();

        let err = package(&p, rpm.as_ref(), None).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_MISSING);
        assert!(!top.path().join("build/rpmspec").exists());
    }

    #[test]
    fn test_package_rejects_colliding_output_names() {
        let top = TempDir::new().unwrap();
        touch(top.path(), "config/test/a_b.bset", "");
        touch(top.path(), "config/test-a-b.bset", "");
        touch(top.path(), "pkg/rpm.spec.in", "Name: @RSB_PKG_NAME@\n");
        let p = params(top.path(), serde_json::json!({}));
        let rpm = backend::backend_by_name("rpm").unwrap();

        let err = package(&p, rpm.as_ref(), None).unwrap_err();

        match &err {
            PipelineError::OutputCollision { first, second, path } => {
                assert_eq!(first.as_str(), "test-a-b");
                assert_eq!(second.as_str(), "test/a_b");
                assert_eq!(path, &top.path().join("build/rpmspec/test-a-b.spec"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(err.exit_code(), EXIT_CONFIG);
        assert!(!top.path().join("build/rpmspec").exists());
    }

    #[test]
    fn test_package_generates_specs() {
        let top = TempDir::new().unwrap();
        touch(top.path(), "config/test/aarch64_config.bset", "");
        touch(top.path(), "pkg/rpm.spec.in", "Name: @RSB_PKG_NAME@\nRelease: @RSB_REVISION@\n");
        let p = params(top.path(), serde_json::json!({"revision": "1-rc"}));
        let rpm = backend::backend_by_name("rpm").unwrap();

        let written = package(&p, rpm.as_ref(), None).unwrap();

        assert_eq!(
            written,
            vec![top.path().join("build/rpmspec/test-aarch64-config.spec")]
        );
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content, "Name: aarch64_config\nRelease: 1_rc\n");
    }
}
