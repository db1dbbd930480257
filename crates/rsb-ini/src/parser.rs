//! Line-oriented INI parser
//!
//! Handles the dialect's conventions:
//! - `[name]` headers, with `[DEFAULT]` holding the defaults scope
//! - `key = value` and `key: value`, split on the first separator
//! - Full-line `#` and `;` comments
//! - Indented lines continue the previous value
//!
//! Keys are lower-cased; section names keep their case.

use crate::document::{IniDocument, Section, DEFAULT_SECTION};
use crate::error::IniError;

/// Where key/value lines currently land.
enum Target {
    None,
    Defaults,
    Named(String),
}

/// Parse INI text into a document.
pub fn parse(input: &str) -> Result<IniDocument, IniError> {
    let mut doc = IniDocument::default();
    let mut target = Target::None;
    let mut last_key: Option<String> = None;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();

        // Blank lines end a multi-line value
        if trimmed.is_empty() {
            last_key = None;
            continue;
        }

        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        let indented = raw.starts_with(|c: char| c.is_whitespace());
        if indented {
            if let Some(key) = &last_key {
                if let Some(value) = section_mut(&mut doc, &target).and_then(|s| s.get_mut(key)) {
                    if !value.is_empty() {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                    continue;
                }
            }
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or(IniError::UnterminatedSection { line })?
                .trim();
            if name.is_empty() {
                return Err(IniError::EmptySectionName { line });
            }
            target = if name == DEFAULT_SECTION {
                Target::Defaults
            } else {
                doc.sections.entry(name.to_string()).or_default();
                Target::Named(name.to_string())
            };
            last_key = None;
            continue;
        }

        let (key, value) = split_pair(trimmed).ok_or_else(|| IniError::MissingSeparator {
            line,
            text: trimmed.to_string(),
        })?;
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return Err(IniError::EmptyKey { line });
        }

        let section =
            section_mut(&mut doc, &target).ok_or(IniError::MissingSectionHeader { line })?;
        section.insert(key.clone(), value.trim().to_string());
        last_key = Some(key);
    }

    Ok(doc)
}

fn section_mut<'a>(doc: &'a mut IniDocument, target: &Target) -> Option<&'a mut Section> {
    match target {
        Target::None => None,
        Target::Defaults => Some(&mut doc.defaults),
        Target::Named(name) => doc.sections.get_mut(name),
    }
}

/// Split on whichever of `=` or `:` comes first.
fn split_pair(line: &str) -> Option<(&str, &str)> {
    let at = line.find(['=', ':'])?;
    Some((&line[..at], &line[at + 1..]))
}
