//! INI reader errors.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

/// Structural error in INI text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IniError {
    /// A key/value line appeared before any `[section]` header.
    #[error("line {line}: key found before any section header")]
    MissingSectionHeader { line: usize },

    /// A line opened a section header with `[` but never closed it.
    #[error("line {line}: unterminated section header")]
    UnterminatedSection { line: usize },

    /// `[]` with nothing inside.
    #[error("line {line}: empty section name")]
    EmptySectionName { line: usize },

    /// A line that is neither a header, a comment nor `key = value`.
    #[error("line {line}: expected 'key = value', found '{text}'")]
    MissingSeparator { line: usize, text: String },

    /// `= value` with nothing on the left.
    #[error("line {line}: empty key")]
    EmptyKey { line: usize },
}

impl IniError {
    /// 1-based line number the error was found on.
    pub fn line(&self) -> usize {
        match self {
            IniError::MissingSectionHeader { line }
            | IniError::UnterminatedSection { line }
            | IniError::EmptySectionName { line }
            | IniError::MissingSeparator { line, .. }
            | IniError::EmptyKey { line } => *line,
        }
    }
}

/// Error loading an INI file from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid UTF-8: {source}", path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: IniError,
    },
}
