//! Layered `configs.ini` override merge
//!
//! Each override file contributes two kinds of values:
//! - `[DEFAULT]` keys apply to every buildset whose directory (relative to
//!   the configuration root) equals the file's directory
//! - `[name]` section keys apply to every buildset whose final path segment
//!   is exactly `name`
//!
//! All files are parsed and every value coerced before anything is applied,
//! so one bad value fails the whole run. Files are applied in sorted path
//! order: first every defaults scope, then every named section. A section
//! value therefore always beats a defaults value for the same key, and
//! between files of the same kind the later path wins.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use rsb_ini::{IniDocument, IniError, DEFAULT_SECTION};

use super::sha256_hex;
use super::value::{parse_override_value, OverrideValue, ValueError};
use crate::catalog::BuildsetEntry;
use crate::scan::OverrideFile;

/// Key that enables or disables a buildset
pub const KEY_ENABLED: &str = "enabled";

/// Key for the advisory `good` flag
pub const KEY_GOOD: &str = "good";

/// Key that forces simulation mode
pub const KEY_DRY_RUN: &str = "dry-run";

/// Override merge errors; all are fatal
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("failed to read override file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("override file {} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("invalid INI syntax in {}: {source}", path.display())]
    Syntax {
        path: PathBuf,
        #[source]
        source: IniError,
    },

    #[error("{}: [{section}] {key} = '{value}': {source}", path.display())]
    InvalidValue {
        path: PathBuf,
        section: String,
        key: String,
        value: String,
        #[source]
        source: ValueError,
    },
}

/// An override file that took part in a merge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideSource {
    pub path: PathBuf,

    /// Directory relative to the configuration root ("" at the root)
    pub scope: String,

    /// SHA-256 digest of raw file bytes
    pub digest: String,
}

/// One parsed override file with every value already coerced
#[derive(Debug, Clone)]
struct ParsedOverrides {
    source: OverrideSource,
    defaults: BTreeMap<String, OverrideValue>,
    sections: BTreeMap<String, BTreeMap<String, OverrideValue>>,
}

/// Result of a merge: new entries plus the files that were read
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub entries: Vec<BuildsetEntry>,
    pub sources: Vec<OverrideSource>,
}

/// Parse every override file, then apply them to `entries`.
///
/// `revision` is the value `version` predicates compare against.
pub fn apply_overrides(
    entries: Vec<BuildsetEntry>,
    files: &[OverrideFile],
    revision: &str,
) -> Result<MergeOutcome, OverrideError> {
    let mut ordered: Vec<&OverrideFile> = files.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let parsed = ordered
        .into_iter()
        .map(|file| parse_file(file, revision))
        .collect::<Result<Vec<_>, _>>()?;

    let mut entries = entries;

    for file in &parsed {
        for entry in entries.iter_mut().filter(|e| e.id.dir() == file.source.scope) {
            tracing::debug!(
                buildset = %entry.id,
                file = %file.source.path.display(),
                keys = file.defaults.len(),
                "applying override defaults"
            );
            apply_values(entry, &file.defaults);
        }
    }

    for file in &parsed {
        for (section, values) in &file.sections {
            for entry in entries.iter_mut().filter(|e| e.id.name() == section.as_str()) {
                tracing::debug!(
                    buildset = %entry.id,
                    file = %file.source.path.display(),
                    section = %section,
                    "applying override section"
                );
                apply_values(entry, values);
            }
        }
    }

    Ok(MergeOutcome {
        entries,
        sources: parsed.into_iter().map(|file| file.source).collect(),
    })
}

fn parse_file(file: &OverrideFile, revision: &str) -> Result<ParsedOverrides, OverrideError> {
    let bytes = fs::read(&file.path).map_err(|source| OverrideError::Io {
        path: file.path.clone(),
        source,
    })?;
    let digest = sha256_hex(&bytes);
    let text = String::from_utf8(bytes).map_err(|source| OverrideError::Encoding {
        path: file.path.clone(),
        source,
    })?;
    let doc = IniDocument::parse(&text).map_err(|source| OverrideError::Syntax {
        path: file.path.clone(),
        source,
    })?;

    let coerce = |section: &str, keys: &BTreeMap<String, String>| {
        keys.iter()
            .map(|(key, raw)| {
                parse_override_value(raw, revision)
                    .map(|value| (key.clone(), value))
                    .map_err(|source| OverrideError::InvalidValue {
                        path: file.path.clone(),
                        section: section.to_string(),
                        key: key.clone(),
                        value: raw.clone(),
                        source,
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
    };

    let defaults = coerce(DEFAULT_SECTION, doc.defaults())?;
    let mut sections = BTreeMap::new();
    for (name, keys) in doc.sections() {
        sections.insert(name.to_string(), coerce(name, keys)?);
    }

    Ok(ParsedOverrides {
        source: OverrideSource {
            path: file.path.clone(),
            scope: file.scope.clone(),
            digest,
        },
        defaults,
        sections,
    })
}

/// Reserved keys update entry attributes; the rest land in `overrides`.
fn apply_values(entry: &mut BuildsetEntry, values: &BTreeMap<String, OverrideValue>) {
    for (key, value) in values {
        match key.as_str() {
            KEY_ENABLED => entry.enabled = value.as_bool(),
            KEY_GOOD => entry.good = value.as_bool(),
            KEY_DRY_RUN => entry.dry_run = value.as_bool(),
            _ => {
                entry.overrides.insert(key.clone(), value.clone());
            }
        }
    }
}
