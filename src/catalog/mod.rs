//! Buildset identifiers, entries and the baseline catalog
//!
//! The catalog is an injected table of known buildsets and their baseline
//! attributes. Discovery adds every buildset found on disk that the catalog
//! does not already know, with default attributes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::OverrideValue;

/// Slash-separated path of a descriptor file relative to the configuration
/// root, without the `.bset` extension (e.g. `test/aarch64-config`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildsetId(String);

impl BuildsetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment, e.g. `aarch64-config` for `test/aarch64-config`.
    pub fn name(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }

    /// Directory part relative to the configuration root, empty at the root.
    pub fn dir(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((dir, _)) => dir,
            None => "",
        }
    }
}

impl fmt::Display for BuildsetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BuildsetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

fn default_true() -> bool {
    true
}

/// Resolved attributes of one buildset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildsetEntry {
    /// Buildset identifier
    #[serde(rename = "buildset")]
    pub id: BuildsetId,

    /// Disabled entries never reach the selected set
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Advisory flag, passed through unchanged
    #[serde(default = "default_true")]
    pub good: bool,

    /// Run the builder in simulation mode
    #[serde(default, rename = "dry-run")]
    pub dry_run: bool,

    /// Every other key contributed by override files
    #[serde(default, skip_deserializing, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, OverrideValue>,
}

impl BuildsetEntry {
    /// Entry with default attributes (enabled, good, not dry-run)
    pub fn new(id: impl Into<BuildsetId>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            good: true,
            dry_run: false,
            overrides: BTreeMap::new(),
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Effective boolean of an override key, if present
    pub fn override_flag(&self, key: &str) -> Option<bool> {
        self.overrides.get(key).map(OverrideValue::as_bool)
    }
}

/// Immutable table of baseline buildset entries
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<BuildsetId, BuildsetEntry>,
}

impl Catalog {
    /// Build a catalog; a later entry with the same id replaces an earlier one.
    pub fn new(entries: impl IntoIterator<Item = BuildsetEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Union of the catalog with discovered ids, sorted by id.
    ///
    /// Discovered ids already in the catalog keep their catalog attributes.
    pub fn with_discovered(&self, discovered: &[BuildsetId]) -> Vec<BuildsetEntry> {
        let mut union = self.entries.clone();
        for id in discovered {
            union
                .entry(id.clone())
                .or_insert_with(|| BuildsetEntry::new(id.clone()));
        }
        union.into_values().collect()
    }
}
