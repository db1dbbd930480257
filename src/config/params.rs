//! Effective build parameters with provenance
//!
//! Global build parameters are merged from three layers:
//! 1. Built-in defaults
//! 2. Parameters file (`rsb-pkg.toml` in the top directory, or `--config`)
//! 3. Command-line flags
//!
//! The result records where each contributing layer came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::defaults::{BuiltinDefaults, DEFAULT_PARAMS_FILE};
use super::merge::merge_layers;
use super::sha256_hex;
use crate::catalog::{BuildsetEntry, Catalog};

/// Origin of a parameters layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ParamsOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing parameters layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsSource {
    pub origin: ParamsOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Global parameters of one resolution run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildParams {
    /// Absolute project top directory; every relative root hangs off it
    #[serde(skip)]
    pub top: PathBuf,

    /// Directory holding `.bset` descriptors and `configs.ini` overrides
    pub config_root: PathBuf,

    /// Build-output directory (logs, work directories, spec files)
    pub build_root: PathBuf,

    /// Directory receiving `<name>.tar.bz2` archives
    pub archive_root: PathBuf,

    /// Install prefix
    pub prefix: String,

    /// Set builder command
    pub builder: String,

    /// Extra options appended to every builder invocation
    #[serde(default)]
    pub builder_opts: Vec<String>,

    /// Pass `--no-install` on real runs
    pub no_install: bool,

    /// Force `--dry-run` on every job
    pub dry_run: bool,

    /// Release version label
    pub version: String,

    /// Revision; must be an integer when `version` predicates are used
    pub revision: String,

    /// Released source tree
    pub released: bool,

    /// Per-buildset spec parameter file (relative paths hang off top)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_config: Option<PathBuf>,

    /// `key=value` macro overrides, highest precedence
    #[serde(default)]
    pub spec_overrides: Vec<String>,

    /// Selection regex; absent or empty selects everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_filter: Option<String>,

    /// Baseline catalog entries
    #[serde(default)]
    pub catalog: Vec<BuildsetEntry>,
}

impl BuildParams {
    pub fn config_dir(&self) -> PathBuf {
        self.top.join(&self.config_root)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.top.join(&self.build_root)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.top.join(&self.archive_root)
    }

    /// Spec parameter file, resolved against top
    pub fn spec_config_path(&self) -> Option<PathBuf> {
        self.spec_config.as_ref().map(|path| self.top.join(path))
    }

    /// Baseline catalog as an immutable table
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.catalog.iter().cloned())
    }

    /// Selection filter, with an empty pattern treated as absent
    pub fn build_filter(&self) -> Option<&str> {
        self.build_filter.as_deref().filter(|p| !p.is_empty())
    }
}

/// Merged build parameters plus the layers that produced them
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveParams {
    pub params: BuildParams,

    /// Contributing layers in precedence order
    pub sources: Vec<ParamsSource>,
}

impl EffectiveParams {
    /// Merge defaults, the parameters file and CLI overrides.
    ///
    /// An explicit `params_file` must exist. Without one, `rsb-pkg.toml` in
    /// `top` is used when present.
    pub fn build(
        top: &Path,
        params_file: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ParamsError> {
        let top = absolute_top(top)?;
        let mut layers = Vec::new();
        let mut sources = Vec::new();

        layers.push(BuiltinDefaults::default().to_value());
        sources.push(ParamsSource {
            origin: ParamsOrigin::Builtin,
            path: None,
            digest: None,
        });

        let file = match params_file {
            Some(path) => Some(path.to_path_buf()),
            None => Some(top.join(DEFAULT_PARAMS_FILE)).filter(|path| path.is_file()),
        };
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "loading parameters file");
            let (value, digest) = Self::load_toml_file(&path)?;
            layers.push(value);
            sources.push(ParamsSource {
                origin: ParamsOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ParamsSource {
                origin: ParamsOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let mut params: BuildParams = serde_json::from_value(merged)
            .map_err(|e| ParamsError::ParseError(format!("invalid parameters: {}", e)))?;
        params.top = top;

        Self::validate(&params)?;

        Ok(Self { params, sources })
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ParamsError> {
        let bytes = fs::read(path)
            .map_err(|e| ParamsError::IoError(format!("{}: {}", path.display(), e)))?;
        let digest = sha256_hex(&bytes);

        let contents = String::from_utf8(bytes).map_err(|e| {
            ParamsError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e))
        })?;
        let toml_value: toml::Value = toml::from_str(&contents).map_err(|e| {
            ParamsError::ParseError(format!("{}: TOML parse error: {}", path.display(), e))
        })?;

        Ok((toml_to_json(toml_value), digest))
    }

    fn validate(params: &BuildParams) -> Result<(), ParamsError> {
        for (name, path) in [
            ("config_root", &params.config_root),
            ("build_root", &params.build_root),
            ("archive_root", &params.archive_root),
        ] {
            if path.as_os_str().is_empty() || path.is_absolute() {
                return Err(ParamsError::ValidationError(format!(
                    "{} must be a non-empty path relative to the top directory",
                    name
                )));
            }
        }

        if params.prefix.trim().is_empty() {
            return Err(ParamsError::ValidationError(
                "prefix cannot be empty".to_string(),
            ));
        }

        if params.builder.trim().is_empty() {
            return Err(ParamsError::ValidationError(
                "builder cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn absolute_top(top: &Path) -> Result<PathBuf, ParamsError> {
    if top.is_absolute() {
        return Ok(top.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| ParamsError::IoError(format!("current directory: {}", e)))?;
    Ok(cwd.join(top))
}

/// Convert TOML Value to JSON Value
fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Build parameter errors
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
