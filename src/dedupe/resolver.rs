use std::fmt;

use super::overlap::OverlapVerdict;
use super::size::sizes_equal;
use super::Item;

/// Final classification of a name group or of a single episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Contains duplicate episodes that are safe to pause.
    Actionable,
    /// Related items have the same size as the collection. Never paused.
    SameSizeOnly,
    /// No episode content was found in the collection.
    NoOverlap,
    /// Episode markers show a different episode than the collection has.
    DistinctContent,
}

/// Overlap result for one candidate episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeOutcome {
    pub item: Item,
    /// `None` when the episode manifest could not be retrieved.
    pub overlap: Option<OverlapVerdict>,
}

/// Resolved result for one name group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedGroup {
    pub name: String,
    /// Presumed collection. Absent when every member has the same size.
    pub collection: Option<Item>,
    /// Episodes contained in the collection with a different size.
    pub duplicate_episodes: Vec<Item>,
    /// Episodes contained in the collection with the same size,
    /// or every member of a group where all sizes are equal.
    pub ambiguous_episodes: Vec<Item>,
    /// Episodes rejected because their episode markers differ from the collection.
    pub distinct_episodes: Vec<Item>,
    /// Episodes skipped because their manifest was not available.
    pub unavailable_episodes: Vec<Item>,
    pub verdict: Verdict,
}

/// Why a name group was not classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Only one item has this name.
    Singleton,
    /// The file manifest of the presumed collection could not be retrieved.
    CollectionUnavailable { collection: Item, error: String },
}

/// Outcome of processing one name group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Skipped { name: String, reason: SkipReason },
    Classified(ClassifiedGroup),
}

impl EpisodeOutcome {
    /// Per-episode verdict relative to the collection.
    ///
    /// Returns `None` when the manifest was unavailable.
    #[must_use]
    pub fn verdict(&self, collection: &Item, size_tolerance: u64) -> Option<Verdict> {
        let overlap = self.overlap?;
        let verdict = if overlap.is_true_overlap {
            if sizes_equal(self.item.size_bytes, collection.size_bytes, size_tolerance) {
                Verdict::SameSizeOnly
            } else {
                Verdict::Actionable
            }
        } else if overlap.marker_conflict {
            Verdict::DistinctContent
        } else {
            Verdict::NoOverlap
        };
        Some(verdict)
    }
}

impl ClassifiedGroup {
    /// Group where every member has the same size so no collection can be picked.
    #[must_use]
    pub fn same_size(name: &str, items: &[Item]) -> Self {
        Self {
            name: name.to_string(),
            collection: None,
            duplicate_episodes: Vec::new(),
            ambiguous_episodes: items.to_vec(),
            distinct_episodes: Vec::new(),
            unavailable_episodes: Vec::new(),
            verdict: Verdict::SameSizeOnly,
        }
    }

    /// True if any episode was found inside the collection.
    #[must_use]
    pub fn has_file_overlaps(&self) -> bool {
        self.collection.is_some() && (!self.duplicate_episodes.is_empty() || !self.ambiguous_episodes.is_empty())
    }

    /// Ids that are safe to pause. Empty unless the group is actionable.
    #[must_use]
    pub fn pause_ids(&self) -> Vec<i64> {
        if self.verdict == Verdict::Actionable {
            self.duplicate_episodes.iter().map(|item| item.id).collect()
        } else {
            Vec::new()
        }
    }
}

impl GroupOutcome {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Skipped { name, .. } => name,
            Self::Classified(group) => &group.name,
        }
    }

    #[must_use]
    pub const fn classified(&self) -> Option<&ClassifiedGroup> {
        match self {
            Self::Classified(group) => Some(group),
            Self::Skipped { .. } => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Actionable => "actionable",
            Self::SameSizeOnly => "same size only",
            Self::NoOverlap => "no overlap",
            Self::DistinctContent => "distinct content",
        };
        write!(f, "{text}")
    }
}

/// Combine the episode outcomes for one collection into a classified group.
///
/// Any duplicate episode makes the group actionable,
/// even when other episodes are ambiguous or distinct.
#[must_use]
pub fn resolve_group(
    name: &str,
    collection: &Item,
    outcomes: Vec<EpisodeOutcome>,
    size_tolerance: u64,
) -> ClassifiedGroup {
    let mut duplicate_episodes = Vec::new();
    let mut ambiguous_episodes = Vec::new();
    let mut distinct_episodes = Vec::new();
    let mut unavailable_episodes = Vec::new();

    for outcome in outcomes {
        match outcome.verdict(collection, size_tolerance) {
            Some(Verdict::Actionable) => duplicate_episodes.push(outcome.item),
            Some(Verdict::SameSizeOnly) => ambiguous_episodes.push(outcome.item),
            Some(Verdict::DistinctContent) => distinct_episodes.push(outcome.item),
            Some(Verdict::NoOverlap) => {}
            None => unavailable_episodes.push(outcome.item),
        }
    }

    let verdict = if !duplicate_episodes.is_empty() {
        Verdict::Actionable
    } else if !ambiguous_episodes.is_empty() {
        Verdict::SameSizeOnly
    } else {
        Verdict::NoOverlap
    };

    ClassifiedGroup {
        name: name.to_string(),
        collection: Some(collection.clone()),
        duplicate_episodes,
        ambiguous_episodes,
        distinct_episodes,
        unavailable_episodes,
        verdict,
    }
}
