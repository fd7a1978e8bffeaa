use itertools::Itertools;

use super::grouper::NameGroups;
use super::marker::{MarkerExtractor, RegexMarkerExtractor};
use super::overlap::analyze_overlap;
use super::report::Report;
use super::resolver::{ClassifiedGroup, EpisodeOutcome, GroupOutcome, SkipReason, resolve_group};
use super::selector::{Candidate, CollectionOrder, largest_first, select_collection};
use super::size::{SizeClass, classify_sizes};
use super::{Item, ManifestSource, Thresholds};

/// Runs the classification pipeline over name groups.
#[derive(Debug, Clone)]
pub struct Classifier<M = RegexMarkerExtractor> {
    thresholds: Thresholds,
    markers: M,
    order: CollectionOrder,
}

/// Outcomes for every name group together with the aggregated statistics.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub outcomes: Vec<GroupOutcome>,
    pub report: Report,
}

impl Classifier {
    /// Create a classifier using the default episode marker pattern.
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self::with_markers(thresholds, RegexMarkerExtractor::default())
    }
}

impl<M: MarkerExtractor> Classifier<M> {
    /// Create a classifier with a custom episode marker extractor.
    #[must_use]
    pub fn with_markers(thresholds: Thresholds, markers: M) -> Self {
        Self {
            thresholds,
            markers,
            order: largest_first,
        }
    }

    /// Replace the ordering used to pick the collection.
    #[must_use]
    pub fn with_order(mut self, order: CollectionOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Split a name group into collection and episodes
    /// if the group needs a file overlap check.
    ///
    /// Returns `None` for single items and groups where all sizes are equal.
    #[must_use]
    pub fn candidate<'a>(&self, items: &'a [Item]) -> Option<Candidate<'a>> {
        match classify_sizes(items, self.thresholds.size_tolerance) {
            SizeClass::SizeVaries => select_collection(items, self.order),
            SizeClass::Singleton | SizeClass::AllEqualSize => None,
        }
    }

    /// Classify a single name group.
    ///
    /// Manifests are requested one at a time: first the collection, then each episode.
    pub fn classify_group<S: ManifestSource + ?Sized>(
        &self,
        name: &str,
        items: &[Item],
        source: &mut S,
    ) -> GroupOutcome {
        let size_class = classify_sizes(items, self.thresholds.size_tolerance);
        if size_class == SizeClass::Singleton {
            return GroupOutcome::Skipped {
                name: name.to_string(),
                reason: SkipReason::Singleton,
            };
        }
        if size_class == SizeClass::AllEqualSize {
            return GroupOutcome::Classified(ClassifiedGroup::same_size(name, items));
        }

        let Some(candidate) = select_collection(items, self.order) else {
            return GroupOutcome::Skipped {
                name: name.to_string(),
                reason: SkipReason::Singleton,
            };
        };

        let collection_files = match source.file_manifest(candidate.collection) {
            Ok(files) => files,
            Err(error) => {
                return GroupOutcome::Skipped {
                    name: name.to_string(),
                    reason: SkipReason::CollectionUnavailable {
                        collection: candidate.collection.clone(),
                        error: format!("{error:#}"),
                    },
                };
            }
        };

        let outcomes = candidate
            .episodes
            .iter()
            .map(|episode| EpisodeOutcome {
                item: (*episode).clone(),
                overlap: source.file_manifest(episode).ok().map(|episode_files| {
                    analyze_overlap(
                        &collection_files,
                        &episode_files,
                        &self.markers,
                        self.thresholds.min_match_ratio,
                    )
                }),
            })
            .collect();

        GroupOutcome::Classified(resolve_group(
            name,
            candidate.collection,
            outcomes,
            self.thresholds.size_tolerance,
        ))
    }

    /// Classify all name groups and fold the outcomes into a report.
    ///
    /// Groups are processed in name order.
    pub fn classify<S: ManifestSource + ?Sized>(&self, groups: &NameGroups, source: &mut S) -> Classification {
        let mut classification = Classification::default();
        for (name, items) in groups.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            let outcome = self.classify_group(name, items, source);
            classification.report.record(&outcome);
            classification.outcomes.push(outcome);
        }
        classification
    }
}

impl Classification {
    /// Groups that contain episodes safe to pause.
    pub fn actionable(&self) -> impl Iterator<Item = &ClassifiedGroup> {
        self.outcomes
            .iter()
            .filter_map(GroupOutcome::classified)
            .filter(|group| !group.pause_ids().is_empty())
    }

    /// Groups where the only related episodes have the same size as the collection.
    pub fn same_size_episodes_only(&self) -> impl Iterator<Item = &ClassifiedGroup> {
        self.outcomes
            .iter()
            .filter_map(GroupOutcome::classified)
            .filter(|group| group.collection.is_some() && group.pause_ids().is_empty() && group.has_file_overlaps())
    }

    /// Every id that is safe to pause across all actionable groups.
    #[must_use]
    pub fn pause_ids(&self) -> Vec<i64> {
        self.actionable().flat_map(ClassifiedGroup::pause_ids).collect()
    }
}
