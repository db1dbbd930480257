//! Parsed INI document.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::LoadError;
use crate::parser::parse;

/// Name of the section whose keys form the defaults scope.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Keys of one section, sorted by key.
pub type Section = BTreeMap<String, String>;

/// A parsed INI document.
///
/// Sections and keys are held in sorted maps so that iteration order is a
/// property of the content, not of the order lines were written in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    pub(crate) defaults: Section,
    pub(crate) sections: BTreeMap<String, Section>,
}

impl IniDocument {
    /// Parse INI text.
    pub fn parse(input: &str) -> Result<Self, crate::IniError> {
        parse(input)
    }

    /// Read and parse an INI file.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = String::from_utf8(bytes).map_err(|source| LoadError::Encoding {
            path: path.to_path_buf(),
            source,
        })?;
        parse(&contents).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Keys of the `[DEFAULT]` section.
    pub fn defaults(&self) -> &Section {
        &self.defaults
    }

    /// Named sections (excluding `[DEFAULT]`) in name order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(name, keys)| (name.as_str(), keys))
    }

    /// Keys of one named section.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    /// Look up a key in a named section, falling back to `[DEFAULT]`.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.sections
            .get(section)
            .and_then(|keys| keys.get(&key))
            .or_else(|| self.defaults.get(&key))
            .map(String::as_str)
    }

    /// True when the document has neither defaults nor sections.
    pub fn is_empty(&self) -> bool {
        self.defaults.is_empty() && self.sections.is_empty()
    }
}
