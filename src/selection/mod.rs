//! Buildset selection
//!
//! Selection works on the union of the catalog and discovered buildsets:
//! 1. Keep entries whose id matches the filter from the start of the id
//! 2. (overrides are merged by the caller)
//! 3. Drop disabled entries and sort by id
//!
//! The filter is compiled before anything is scanned so that a bad pattern
//! fails the run up front.

use regex_lite::Regex;

use crate::catalog::BuildsetEntry;

/// Selection errors
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("builds filter regex invalid: '{pattern}': {message}")]
    InvalidFilter { pattern: String, message: String },
}

/// Compiled buildset filter
#[derive(Debug, Clone)]
pub struct BuildFilter {
    pattern: String,
    regex: Regex,
}

impl BuildFilter {
    /// Compile a filter. The pattern is anchored at the start of the id but
    /// not at the end, so `test/aarch` selects `test/aarch64-config`.
    pub fn new(pattern: &str) -> Result<Self, SelectionError> {
        let regex =
            Regex::new(&format!("^(?:{})", pattern)).map_err(|e| SelectionError::InvalidFilter {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Compile an optional filter; absent or empty means "select all".
    pub fn from_option(pattern: Option<&str>) -> Result<Option<Self>, SelectionError> {
        match pattern {
            Some(p) if !p.is_empty() => Self::new(p).map(Some),
            _ => Ok(None),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, id: &str) -> bool {
        self.regex.is_match(id)
    }
}

/// Keep the candidates matching `filter` (all of them without one).
pub fn filter_candidates(
    candidates: Vec<BuildsetEntry>,
    filter: Option<&BuildFilter>,
) -> Vec<BuildsetEntry> {
    let Some(filter) = filter else {
        return candidates;
    };
    candidates
        .into_iter()
        .filter(|entry| {
            let keep = filter.matches(entry.id.as_str());
            if !keep {
                tracing::debug!(buildset = %entry.id, filter = filter.pattern(), "filtered out");
            }
            keep
        })
        .collect()
}

/// Drop disabled entries and sort by id.
pub fn retain_enabled(entries: Vec<BuildsetEntry>) -> Vec<BuildsetEntry> {
    let mut selected: Vec<BuildsetEntry> = entries
        .into_iter()
        .filter(|entry| {
            if !entry.enabled {
                tracing::debug!(buildset = %entry.id, "disabled, not selected");
            }
            entry.enabled
        })
        .collect();
    selected.sort_by(|a, b| a.id.cmp(&b.id));
    selected.dedup_by(|a, b| a.id == b.id);
    selected
}
