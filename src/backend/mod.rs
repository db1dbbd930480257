//! Packaging backends
//!
//! A backend turns a materialized job into one generated file (an RPM spec
//! file, for instance). Backends are registered explicitly: the host OS or
//! an explicit name picks one, and the CLI drives it.

mod rpm;
mod template;

pub use rpm::{RpmBackend, SPEC_DIR};
pub use template::render_template;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rsb_ini::IniDocument;

use crate::config::BuildParams;
use crate::job::JobDescriptor;
use crate::spec::SpecError;

/// Names of every registered backend
pub const BACKENDS: &[&str] = &["rpm"];

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("unknown packaging backend '{0}' (known: {known})", known = BACKENDS.join(", "))]
    UnknownBackend(String),

    #[error("no packaging backend for host system '{0}'")]
    Unsupported(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Inputs shared by every job of one packaging run
#[derive(Debug, Clone, Copy)]
pub struct PackageContext<'a> {
    pub params: &'a BuildParams,

    /// Template source text
    pub template: &'a str,

    /// Optional spec parameter file
    pub spec_config: Option<&'a IniDocument>,
}

/// A packaging backend
pub trait Backend {
    /// Registry name
    fn name(&self) -> &'static str;

    /// One-line description
    fn description(&self) -> &'static str;

    /// Template path relative to the top directory
    fn default_template(&self) -> &'static str;

    /// Where the generated file for `job` goes
    fn output_path(&self, job: &JobDescriptor, params: &BuildParams) -> PathBuf;

    /// Render the generated file's content
    fn render(&self, job: &JobDescriptor, ctx: &PackageContext<'_>) -> Result<String, BackendError>;
}

/// Look a backend up by name.
pub fn backend_by_name(name: &str) -> Result<Box<dyn Backend>, BackendError> {
    match name {
        "rpm" => Ok(Box::new(RpmBackend)),
        other => Err(BackendError::UnknownBackend(other.to_string())),
    }
}

/// Backend for an operating system name as in `std::env::consts::OS`.
pub fn backend_for_os(os: &str) -> Result<Box<dyn Backend>, BackendError> {
    match os {
        "linux" => Ok(Box::new(RpmBackend)),
        other => Err(BackendError::Unsupported(other.to_string())),
    }
}

/// Backend for the running host
pub fn backend_for_host() -> Result<Box<dyn Backend>, BackendError> {
    backend_for_os(std::env::consts::OS)
}

/// Read a template file.
pub fn load_template(path: &Path) -> Result<String, BackendError> {
    if !path.is_file() {
        return Err(BackendError::TemplateNotFound {
            path: path.to_path_buf(),
        });
    }
    fs::read_to_string(path).map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `job` and write the result, returning the written path.
pub fn generate(
    backend: &dyn Backend,
    job: &JobDescriptor,
    ctx: &PackageContext<'_>,
) -> Result<PathBuf, BackendError> {
    let content = backend.render(job, ctx)?;
    let path = backend.output_path(job, ctx.params);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BackendError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&path, content).map_err(|source| BackendError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(backend = backend.name(), buildset = %job.buildset, path = %path.display(), "generated");
    Ok(path)
}
