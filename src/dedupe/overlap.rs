use std::collections::HashSet;

use super::FileEntry;
use super::marker::MarkerExtractor;

/// Result of comparing an episode manifest against a collection manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlapVerdict {
    /// The episode content is contained in the collection.
    pub is_true_overlap: bool,
    /// Number of episode files with a matching collection file.
    pub overlap_count: usize,
    /// Both sides have episode markers but none of them are shared.
    pub marker_conflict: bool,
}

/// Get the final segment of a slash-separated path.
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Decide whether the episode files are part of the collection.
///
/// File names are compared by basename only,
/// matching when equal or when either name contains the other.
/// The episode counts as contained when at least
/// `floor(episode file count * min_match_ratio)` of its files match.
///
/// Two guards reject the pairing regardless of the match count:
/// a collection with fewer files than the episode,
/// and episode markers present on both sides with no marker in common.
#[must_use]
pub fn analyze_overlap<M: MarkerExtractor + ?Sized>(
    collection: &[FileEntry],
    episode: &[FileEntry],
    markers: &M,
    min_match_ratio: f64,
) -> OverlapVerdict {
    if collection.len() < episode.len() {
        return OverlapVerdict::default();
    }

    let collection_names: Vec<&str> = collection.iter().map(FileEntry::basename).collect();
    let episode_names: Vec<&str> = episode.iter().map(FileEntry::basename).collect();

    let overlap_count = episode_names
        .iter()
        .filter(|episode_name| {
            collection_names
                .iter()
                .any(|collection_name| names_match(collection_name, episode_name))
        })
        .count();

    let collection_markers = extract_markers(&collection_names, markers);
    let episode_markers = extract_markers(&episode_names, markers);
    if !collection_markers.is_empty()
        && !episode_markers.is_empty()
        && collection_markers.is_disjoint(&episode_markers)
    {
        return OverlapVerdict {
            is_true_overlap: false,
            overlap_count,
            marker_conflict: true,
        };
    }

    let required = (episode.len() as f64 * min_match_ratio).floor() as usize;
    OverlapVerdict {
        is_true_overlap: overlap_count >= required,
        overlap_count,
        marker_conflict: false,
    }
}

fn names_match(collection_name: &str, episode_name: &str) -> bool {
    if collection_name.is_empty() || episode_name.is_empty() {
        return false;
    }
    collection_name == episode_name
        || collection_name.contains(episode_name)
        || episode_name.contains(collection_name)
}

fn extract_markers<M: MarkerExtractor + ?Sized>(names: &[&str], markers: &M) -> HashSet<String> {
    names.iter().filter_map(|name| markers.extract_marker(name)).collect()
}
