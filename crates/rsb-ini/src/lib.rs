//! INI reader for buildset configuration files.
//!
//! Reads the INI dialect used by per-directory `configs.ini` override files
//! and by the optional spec parameter file. The reader is deliberately
//! strict about structure (every error carries a line number) and lenient
//! about repetition: repeated sections merge and repeated keys overwrite.

mod document;
mod error;
mod parser;

pub use document::{IniDocument, Section, DEFAULT_SECTION};
pub use error::{IniError, LoadError};
pub use parser::parse;
