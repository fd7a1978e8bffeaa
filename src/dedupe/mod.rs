//! Collection and episode duplicate classification.
//!
//! Takes a flat list of torrents with their file manifests and sorts the
//! same-named ones into groups that are safe to pause, groups that only look
//! related because the sizes match, and groups with no real content overlap.
//!
//! The pipeline runs top-down:
//! name grouping, size classification, collection selection,
//! file overlap analysis and finally group resolution.
//! Nothing here performs I/O: file manifests are provided through [`ManifestSource`].

mod classifier;
mod grouper;
mod marker;
mod overlap;
mod report;
mod resolver;
mod selector;
mod size;

use std::collections::HashMap;

use anyhow::{Result, anyhow};

pub use classifier::{Classification, Classifier};
pub use grouper::{NameGroups, group_by_name};
pub use marker::{DEFAULT_MARKER_PATTERN, MarkerExtractor, RegexMarkerExtractor};
pub use overlap::{OverlapVerdict, analyze_overlap, basename};
pub use report::Report;
pub use resolver::{ClassifiedGroup, EpisodeOutcome, GroupOutcome, SkipReason, Verdict, resolve_group};
pub use selector::{Candidate, CollectionOrder, largest_first, select_collection};
pub use size::{SizeClass, classify_sizes, sizes_equal};

/// Default tolerance in bytes for two sizes to be considered equal.
pub const DEFAULT_SIZE_TOLERANCE: u64 = 1024;

/// Default fraction of episode files that must be found in the collection.
pub const DEFAULT_MIN_MATCH_RATIO: f64 = 0.5;

/// A torrent as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Stable identifier on the remote daemon.
    pub id: i64,
    /// Display name, not unique.
    pub name: String,
    /// Size in bytes when fully downloaded.
    pub size_bytes: u64,
}

/// One file inside a torrent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Slash-separated path relative to the torrent root.
    pub path: String,
}

/// Tunable thresholds for the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Maximum byte difference for two sizes to count as equal.
    pub size_tolerance: u64,
    /// Fraction of episode files that must match collection files.
    pub min_match_ratio: f64,
}

/// Provides file manifests for items.
///
/// Any error means the manifest is unavailable for that item.
pub trait ManifestSource {
    /// Get the file list of the given item.
    ///
    /// # Errors
    /// Returns an error if the manifest cannot be retrieved.
    fn file_manifest(&mut self, item: &Item) -> Result<Vec<FileEntry>>;
}

impl Item {
    #[must_use]
    pub fn new(id: i64, name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id,
            name: name.into(),
            size_bytes,
        }
    }
}

impl FileEntry {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The final path segment.
    #[must_use]
    pub fn basename(&self) -> &str {
        basename(&self.path)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            size_tolerance: DEFAULT_SIZE_TOLERANCE,
            min_match_ratio: DEFAULT_MIN_MATCH_RATIO,
        }
    }
}

impl ManifestSource for HashMap<i64, Vec<FileEntry>> {
    fn file_manifest(&mut self, item: &Item) -> Result<Vec<FileEntry>> {
        self.get(&item.id)
            .cloned()
            .ok_or_else(|| anyhow!("No file manifest for torrent ID {}", item.id))
    }
}
