// src/core/search.rs

use regex::Regex;

use crate::models::ProjectRecord;

/// A case-insensitive substring filter over project file names and full
/// paths, with `*` matching any run of characters and `?` matching exactly
/// one.
///
/// The pattern is unanchored: `vj*live` matches `vj_intro_live.toe`, while
/// `project?.toe` does not match `project12.toe` because `?` consumes a
/// single character.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    regex: Option<Regex>,
}

impl SearchFilter {
    /// Compiles a filter from raw user input. Empty or whitespace-only
    /// input yields a match-everything filter; regex metacharacters in the
    /// input are treated literally.
    pub fn compile(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self { regex: None };
        }

        let mut pattern = String::with_capacity(trimmed.len() + 8);
        pattern.push_str("(?i)");
        for ch in trimmed.chars() {
            match ch {
                '*' => pattern.push_str(".*"),
                '?' => pattern.push('.'),
                other => pattern.push_str(&regex::escape(&other.to_string())),
            }
        }

        // The escaped pattern is valid by construction; a failure here
        // degrades to showing everything rather than erroring the session.
        let regex = match Regex::new(&pattern) {
            Ok(re) => Some(re),
            Err(err) => {
                log::warn!("Ignoring unusable search pattern '{trimmed}': {err}");
                None
            }
        };
        Self { regex }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.as_ref().is_none_or(|re| re.is_match(text))
    }

    /// Filters records by file name or full path, preserving their order.
    pub fn apply<'a>(&self, records: &'a [ProjectRecord]) -> Vec<&'a ProjectRecord> {
        records
            .iter()
            .filter(|record| {
                self.is_match(&record.file_name()) || self.is_match(&record.path.to_string_lossy())
            })
            .collect()
    }
}
