use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

/// Default season and episode marker, for example `S01E02`.
pub const DEFAULT_MARKER_PATTERN: &str = r"(?i)S\d+E\d+";

static RE_DEFAULT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_MARKER_PATTERN).expect("Invalid episode marker regex"));

/// Extracts an episode marker from a file name.
pub trait MarkerExtractor {
    /// Return the marker found in the file name, if any.
    fn extract_marker(&self, file_name: &str) -> Option<String>;
}

/// Marker extractor backed by a list of regex patterns.
///
/// Patterns are tried in order and the first match is returned as is.
#[derive(Debug, Clone)]
pub struct RegexMarkerExtractor {
    patterns: Vec<Regex>,
}

impl RegexMarkerExtractor {
    /// Create an extractor with the default pattern followed by the given extra patterns.
    ///
    /// # Errors
    /// Returns an error if any of the extra patterns is not a valid regex.
    pub fn with_patterns(extra_patterns: &[String]) -> Result<Self> {
        let mut patterns = vec![RE_DEFAULT_MARKER.clone()];
        for pattern in extra_patterns {
            let regex = Regex::new(pattern).with_context(|| format!("Invalid marker pattern: {pattern}"))?;
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }
}

impl Default for RegexMarkerExtractor {
    fn default() -> Self {
        Self {
            patterns: vec![RE_DEFAULT_MARKER.clone()],
        }
    }
}

impl MarkerExtractor for RegexMarkerExtractor {
    fn extract_marker(&self, file_name: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|regex| regex.find(file_name))
            .map(|found| found.as_str().to_string())
    }
}
