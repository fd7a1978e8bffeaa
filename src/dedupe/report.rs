use colored::Colorize;

use super::resolver::{GroupOutcome, SkipReason, Verdict};

/// Run statistics folded over the group outcomes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub processed: usize,
    pub singletons: usize,
    pub collection_unavailable: usize,
    pub same_size: usize,
    pub without_episodes: usize,
    pub only_same_size_episodes: usize,
    pub actionable: usize,
    pub distinct_episodes: usize,
    pub unavailable_episodes: usize,
}

impl Report {
    /// Add one group outcome to the counters.
    pub fn record(&mut self, outcome: &GroupOutcome) {
        self.processed += 1;
        match outcome {
            GroupOutcome::Skipped { reason, .. } => match reason {
                SkipReason::Singleton => self.singletons += 1,
                SkipReason::CollectionUnavailable { .. } => self.collection_unavailable += 1,
            },
            GroupOutcome::Classified(group) => {
                self.distinct_episodes += group.distinct_episodes.len();
                self.unavailable_episodes += group.unavailable_episodes.len();
                match group.verdict {
                    Verdict::Actionable => self.actionable += 1,
                    Verdict::SameSizeOnly if group.collection.is_none() => self.same_size += 1,
                    Verdict::SameSizeOnly => self.only_same_size_episodes += 1,
                    Verdict::NoOverlap | Verdict::DistinctContent => self.without_episodes += 1,
                }
            }
        }
    }

    /// Groups that were not classified at all.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.singletons + self.collection_unavailable
    }

    pub fn print_summary(&self) {
        println!("\n{}", "Statistics:".bold());
        println!("  Groups processed:                 {}", self.processed);
        println!("  Groups skipped:                   {}", self.skipped());
        println!("  Same size groups skipped:         {}", self.same_size);
        println!("  Distinct episodes skipped:        {}", self.distinct_episodes);
        println!("  Groups without episodes:          {}", self.without_episodes);
        println!("  Groups with only same size:       {}", self.only_same_size_episodes);
        if self.unavailable_episodes > 0 || self.collection_unavailable > 0 {
            println!(
                "  {} {}",
                "Missing file lists:              ".yellow(),
                self.unavailable_episodes + self.collection_unavailable
            );
        }
        println!("  {}        {}", "Actionable groups:".green(), self.actionable);
    }
}
