//! Line-oriented reference extraction
//!
//! A reference is whatever the configured pattern captures in its single
//! capture group. Extraction is purely textual: every line is matched on its
//! own and a line with several non-overlapping matches yields several pairs.

pub mod software;

pub use software::{SoftwareDetector, SoftwareDetectors};

use regex::Regex;
use std::path::{Path, PathBuf};

/// A captured tag and the `path:line` location it was found at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub tag: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    pattern: Regex,
    trim_suffix: Option<String>,
    strip_prefix: Option<PathBuf>,
}

impl ReferenceExtractor {
    /// `pattern` is expected to carry exactly one capture group; config
    /// validation enforces that before an extractor is ever built.
    pub fn new(pattern: Regex) -> Self {
        Self {
            pattern,
            trim_suffix: None,
            strip_prefix: None,
        }
    }

    pub fn with_trim_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.trim_suffix = (!suffix.is_empty()).then_some(suffix);
        self
    }

    /// Locations are reported relative to `prefix` (normally the working directory)
    pub fn with_strip_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    pub fn extract_line(&self, path: &Path, line_number: usize, line: &str) -> Vec<Reference> {
        self.pattern
            .captures_iter(line)
            .filter_map(|cap| cap.get(1))
            .map(|m| Reference {
                tag: self.trim(m.as_str()).to_string(),
                location: self.location(path, line_number),
            })
            .collect()
    }

    fn trim<'a>(&self, captured: &'a str) -> &'a str {
        match &self.trim_suffix {
            Some(suffix) => captured.strip_suffix(suffix.as_str()).unwrap_or(captured),
            None => captured,
        }
    }

    fn location(&self, path: &Path, line_number: usize) -> String {
        let relative = self
            .strip_prefix
            .as_deref()
            .and_then(|prefix| path.strip_prefix(prefix).ok());

        match relative {
            Some(rel) => format!("/{}:{}", rel.display(), line_number),
            None => format!("{}:{}", path.display(), line_number),
        }
    }
}
