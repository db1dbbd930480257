//! Per-buildset spec parameters
//!
//! Resolves the macro definitions handed to a packaging backend's template:
//! 1. `key=value` overrides given for this run (highest precedence)
//! 2. Items of the spec parameter file section named after the buildset id
//! 3. A placeholder comment when that file has no section for the buildset

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use rsb_ini::{IniDocument, LoadError};

use crate::catalog::BuildsetId;

/// Spec parameter errors
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("invalid spec override '{0}': expected key=value")]
    InvalidOverride(String),

    #[error("invalid spec override '{0}': empty key")]
    EmptyKey(String),

    #[error("spec parameter file: {0}")]
    Load(#[from] LoadError),
}

/// One line of resolved spec parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecLine {
    /// A macro definition
    Define { key: String, value: String },
    /// Explanatory text with no effect
    Comment(String),
}

impl fmt::Display for SpecLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecLine::Define { key, value } => write!(f, "{}={}", key, value),
            SpecLine::Comment(text) => write!(f, "# {}", text),
        }
    }
}

/// Split one `key=value` override on its first `=`.
pub fn parse_spec_override(raw: &str) -> Result<(String, String), SpecError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| SpecError::InvalidOverride(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(SpecError::EmptyKey(raw.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Validate every override without resolving anything.
pub fn validate_spec_overrides(overrides: &[String]) -> Result<(), SpecError> {
    overrides
        .iter()
        .try_for_each(|raw| parse_spec_override(raw).map(|_| ()))
}

/// Load the optional spec parameter file.
pub fn load_spec_config(path: Option<&Path>) -> Result<Option<IniDocument>, SpecError> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading spec parameter file");
            let doc = IniDocument::from_file(path)?;
            if doc.is_empty() {
                tracing::warn!(path = %path.display(), "spec parameter file is empty");
            }
            Ok(Some(doc))
        }
        None => Ok(None),
    }
}

/// Resolve the spec parameter lines for one buildset.
///
/// File items whose key is also overridden are dropped so that each key is
/// defined once, with the override's value.
pub fn resolve_spec_params(
    config: Option<&IniDocument>,
    buildset: &BuildsetId,
    overrides: &[String],
) -> Result<Vec<SpecLine>, SpecError> {
    let mut lines = Vec::new();
    let mut overridden = BTreeSet::new();

    for raw in overrides {
        let (key, value) = parse_spec_override(raw)?;
        overridden.insert(key.to_lowercase());
        lines.push(SpecLine::Define { key, value });
    }

    match config.and_then(|doc| doc.section(buildset.as_str())) {
        Some(items) => {
            for (key, value) in items {
                if overridden.contains(key) {
                    continue;
                }
                lines.push(SpecLine::Define {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
        None => lines.push(SpecLine::Comment(format!(
            "no user configuration for buildset {}",
            buildset
        ))),
    }

    Ok(lines)
}
