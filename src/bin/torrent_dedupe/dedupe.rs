//! Main dedupe logic module for tdedupe.
//!
//! Fetches the torrent list and file lists from Transmission,
//! runs the classifier and pauses the duplicate episode torrents.

use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;

use torrent_dedupe::dedupe::{
    Classification, Classifier, ClassifiedGroup, GroupOutcome, Item, SkipReason, group_by_name,
};
use torrent_dedupe::{format_size, print_error, print_warning};

use crate::Args;
use crate::config::Config;
use crate::logger::FileLogger;
use crate::manifest::ManifestCache;
use crate::stats::PauseStats;
use crate::transmission::{PAUSE_TIMEOUT, RemoteTorrent, SINGLE_PAUSE_TIMEOUT, TransmissionClient};

/// Number of collection files shown per actionable group.
const COLLECTION_FILES_SHOWN: usize = 5;

/// Number of files shown per duplicate episode.
const EPISODE_FILES_SHOWN: usize = 3;

/// Delay between single torrent pause attempts after a failed batch.
const SINGLE_PAUSE_DELAY: Duration = Duration::from_secs(1);

/// Main handler for finding and pausing duplicate torrents.
pub struct TorrentDedupe {
    config: Config,
}

impl TorrentDedupe {
    /// Create a new `TorrentDedupe` from command line arguments.
    ///
    /// Loads user configuration and merges it with CLI arguments.
    ///
    /// # Errors
    /// Returns an error if the config is invalid.
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::from_args(args)?;
        Ok(Self { config })
    }

    /// Run the main dedupe workflow.
    ///
    /// # Errors
    /// Returns an error if the torrent list cannot be fetched.
    pub async fn run(self) -> Result<()> {
        self.print_connection_info();

        let mut logger = match FileLogger::new() {
            Ok(logger) => Some(logger),
            Err(error) => {
                print_warning!("Run log disabled: {error:#}");
                None
            }
        };
        if let Some(ref mut logger) = logger {
            logger.log_init(&self.config);
        }

        let mut client = TransmissionClient::new(
            &self.config.host,
            self.config.port,
            self.config.https,
            &self.config.username,
            &self.config.password,
        )?;

        if self.config.verbose {
            match client.get_version().await {
                Ok((version, rpc_version)) => {
                    println!("Transmission {version} (RPC version {rpc_version})");
                }
                Err(error) => print_warning!("Failed to get Transmission version: {error:#}"),
            }
        }

        let torrents = self.fetch_torrents(&mut client).await?;
        let items = filter_by_suffix(to_items(torrents), &self.config.suffixes);
        if items.is_empty() {
            println!("{}", "No torrents found.".yellow());
            return Ok(());
        }
        println!("Found {} torrents", items.len());

        let groups = group_by_name(items);
        let classifier = Classifier::with_markers(self.config.thresholds, self.config.markers.clone());
        if self.config.verbose {
            let thresholds = classifier.thresholds();
            println!(
                "Size tolerance: {} bytes, match ratio: {}",
                thresholds.size_tolerance, thresholds.min_match_ratio
            );
        }

        let mut cache = ManifestCache::prefetch(&mut client, &classifier, &groups).await;
        if self.config.verbose && cache.error_count() > 0 {
            println!("{} file lists could not be fetched", cache.error_count());
        }

        let classification = classifier.classify(&groups, &mut cache);

        self.print_classification(&classification, &cache);
        classification.report.print_summary();

        let actionable: Vec<&ClassifiedGroup> = classification.actionable().collect();
        if actionable.is_empty() {
            println!("\n{}", "No duplicate episodes to pause.".green());
            if let Some(ref mut logger) = logger {
                logger.log_summary(&classification.report, None);
            }
            return Ok(());
        }

        let total = classification.pause_ids().len();
        if self.config.dryrun {
            println!("\n{}", format!("Dry run: would pause {total} torrents").cyan().bold());
            if let Some(ref mut logger) = logger {
                for group in &actionable {
                    logger.log_group(group);
                }
                logger.log_summary(&classification.report, None);
            }
            return Ok(());
        }

        if !self.config.yes
            && !torrent_dedupe::confirm_with_user(&format!("\nPause {total} duplicate torrents?"), false)
                .context("Failed to read confirmation")?
        {
            println!("{}", "Cancelled".yellow());
            return Ok(());
        }

        let mut stats = PauseStats::new(total);
        for group in &actionable {
            if let Some(ref mut logger) = logger {
                logger.log_group(group);
            }
            Self::pause_group(&mut client, group, &mut stats, logger.as_mut()).await;
        }

        stats.print_summary();
        if let Some(ref mut logger) = logger {
            logger.log_summary(&classification.report, Some(&stats));
            if self.config.verbose {
                println!("Log written to {}", logger.path().display());
            }
        }

        Ok(())
    }

    fn print_connection_info(&self) {
        let scheme = if self.config.https { "https" } else { "http" };
        println!(
            "{}",
            format!("Connecting to {scheme}://{}:{}", self.config.host, self.config.port).bold()
        );
        if self.config.has_credentials() {
            println!(
                "  User: {} Password: {}",
                self.config.username,
                self.config.masked_password()
            );
        }
        if !self.config.suffixes.is_empty() {
            println!("  Suffixes: {}", self.config.suffixes.join(", "));
        }
        if self.config.verbose && !self.config.marker_patterns.is_empty() {
            println!("  Extra markers: {}", self.config.marker_patterns.join(", "));
        }
        if self.config.dryrun {
            println!("{}", "Running in dry-run mode".yellow());
        }
    }

    /// Fetch the torrent list, retrying with a linearly growing delay.
    async fn fetch_torrents(&self, client: &mut TransmissionClient) -> Result<Vec<RemoteTorrent>> {
        let mut attempt = 1;
        loop {
            match client.get_torrents().await {
                Ok(torrents) => return Ok(torrents),
                Err(error) if attempt < self.config.retries => {
                    let delay = retry_delay(self.config.retry_delay, attempt);
                    print_warning!(
                        "Failed to get torrent list (attempt {attempt}/{}): {error:#}\nRetrying in {}s...",
                        self.config.retries,
                        delay.as_secs()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    return Err(error).with_context(|| {
                        format!("Failed to get torrent list after {} attempts", self.config.retries)
                    });
                }
            }
        }
    }

    fn print_classification(&self, classification: &Classification, cache: &ManifestCache) {
        if self.config.verbose {
            for outcome in &classification.outcomes {
                match outcome {
                    GroupOutcome::Skipped {
                        name,
                        reason: SkipReason::CollectionUnavailable { collection, error },
                    } => {
                        print_warning!("Skipped {name}: collection {} file list unavailable: {error}", collection.id);
                    }
                    GroupOutcome::Classified(group) if group.collection.is_none() => {
                        println!(
                            "{} {} ({} torrents)",
                            "Same size:".dimmed(),
                            group.name,
                            group.ambiguous_episodes.len()
                        );
                    }
                    GroupOutcome::Skipped { .. } | GroupOutcome::Classified(_) => {}
                }
            }
        }

        for group in classification.same_size_episodes_only() {
            println!();
            for line in same_size_group_lines(group) {
                println!("{line}");
            }
        }

        for group in classification.actionable() {
            print_group(group, cache);
        }
    }

    /// Pause all duplicates of a group in one request.
    ///
    /// Falls back to pausing them one at a time if the batch request fails.
    async fn pause_group(
        client: &mut TransmissionClient,
        group: &ClassifiedGroup,
        stats: &mut PauseStats,
        mut logger: Option<&mut FileLogger>,
    ) {
        let ids = group.pause_ids();
        match client.stop_torrents(&ids, PAUSE_TIMEOUT).await {
            Ok(()) => {
                println!("{} {} ({})", "Paused:".green(), group.name, ids.len());
                stats.record_paused(&ids);
                if let Some(logger) = logger.as_deref_mut() {
                    logger.log_pause(&group.name, &ids, None);
                }
                return;
            }
            Err(error) => {
                print_warning!("Batch pause failed for {}: {error:#}", group.name);
                stats.inc_batch_fallback();
            }
        }

        for (index, id) in ids.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(SINGLE_PAUSE_DELAY).await;
            }
            match client.stop_torrents(&[*id], SINGLE_PAUSE_TIMEOUT).await {
                Ok(()) => {
                    println!("{} {} [{id}]", "Paused:".green(), group.name);
                    stats.record_paused(&[*id]);
                    if let Some(logger) = logger.as_deref_mut() {
                        logger.log_pause(&group.name, &[*id], None);
                    }
                }
                Err(error) => {
                    print_error!("Failed to pause torrent ID {id}: {error:#}");
                    stats.record_failed(*id);
                    if let Some(logger) = logger.as_deref_mut() {
                        logger.log_pause(&group.name, &[*id], Some(&format!("{error:#}")));
                    }
                }
            }
        }
    }
}

/// Print an actionable group with a sample of its files.
fn print_group(group: &ClassifiedGroup, cache: &ManifestCache) {
    let Some(ref collection) = group.collection else {
        return;
    };

    println!("\n{}", group.name.bold());
    println!(
        "  {} [{}] {}",
        "Collection:".cyan(),
        collection.id,
        format_size(collection.size_bytes)
    );
    print_files(cache, collection.id, COLLECTION_FILES_SHOWN, "    ");

    for episode in &group.duplicate_episodes {
        println!(
            "  {} [{}] {}",
            "Duplicate:".yellow(),
            episode.id,
            format_size(episode.size_bytes)
        );
        print_files(cache, episode.id, EPISODE_FILES_SHOWN, "    ");
    }
    for episode in &group.ambiguous_episodes {
        println!(
            "  {} [{}] {}",
            "Same size:".dimmed(),
            episode.id,
            format_size(episode.size_bytes)
        );
    }
    println!("  File overlap: {}", torrent_dedupe::colorize_bool(group.has_file_overlaps()));
}

/// Describe a group whose contained episodes all have the collection size.
fn same_size_group_lines(group: &ClassifiedGroup) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} (never paused)",
        "Only same size:".yellow(),
        group.name.bold()
    )];
    if let Some(ref collection) = group.collection {
        lines.push(format!(
            "  {} [{}] {}",
            "Collection:".cyan(),
            collection.id,
            format_size(collection.size_bytes)
        ));
    }
    for episode in &group.ambiguous_episodes {
        lines.push(format!(
            "  {} [{}] {}",
            "Same size:".dimmed(),
            episode.id,
            format_size(episode.size_bytes)
        ));
    }
    lines.push(format!(
        "  File overlap: {}",
        torrent_dedupe::colorize_bool(group.has_file_overlaps())
    ));
    lines
}

fn print_files(cache: &ManifestCache, id: i64, limit: usize, indent: &str) {
    let files = cache.files(id);
    for file in files.iter().take(limit) {
        println!("{indent}{}", file.path);
    }
    if files.len() > limit {
        println!("{indent}{}", format!("... and {} more", files.len() - limit).dimmed());
    }
}

/// Convert remote torrents to classifier items, dropping incomplete entries.
fn to_items(torrents: Vec<RemoteTorrent>) -> Vec<Item> {
    torrents.into_iter().filter_map(RemoteTorrent::into_item).collect()
}

/// Keep only items whose name ends with one of the suffixes.
///
/// An empty suffix list keeps everything.
fn filter_by_suffix(items: Vec<Item>, suffixes: &[String]) -> Vec<Item> {
    if suffixes.is_empty() {
        return items;
    }
    items
        .into_iter()
        .filter(|item| suffixes.iter().any(|suffix| item.name.ends_with(suffix.as_str())))
        .collect()
}

/// Delay before the next attempt, growing linearly with the attempt number.
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

#[cfg(test)]
mod tests {
    use torrent_dedupe::dedupe::{EpisodeOutcome, OverlapVerdict, resolve_group};

    use super::*;

    fn items() -> Vec<Item> {
        vec![
            Item::new(1, "Show.ADWeb", 100),
            Item::new(2, "Movie.HHWEB", 200),
            Item::new(3, "Other.mkv", 300),
        ]
    }

    #[test]
    fn empty_suffixes_keep_everything() {
        assert_eq!(filter_by_suffix(items(), &[]).len(), 3);
    }

    #[test]
    fn filters_by_any_suffix() {
        let suffixes = vec!["ADWeb".to_string(), "HHWEB".to_string()];
        let filtered = filter_by_suffix(items(), &suffixes);
        let ids: Vec<i64> = filtered.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn suffix_match_is_case_sensitive() {
        let suffixes = vec!["adweb".to_string()];
        assert!(filter_by_suffix(items(), &suffixes).is_empty());
    }

    #[test]
    fn same_size_group_shows_collection_and_overlap() {
        colored::control::set_override(false);
        let collection = Item::new(1, "Show.ADWeb", 5 * 1024 * 1024 * 1024);
        let episode = Item::new(2, "Show.ADWeb", 5 * 1024 * 1024 * 1024 + 100);
        let group = resolve_group(
            "Show.ADWeb",
            &collection,
            vec![EpisodeOutcome {
                item: episode,
                overlap: Some(OverlapVerdict {
                    is_true_overlap: true,
                    overlap_count: 1,
                    marker_conflict: false,
                }),
            }],
            1024,
        );

        let lines = same_size_group_lines(&group);
        assert_eq!(
            lines,
            vec![
                "Only same size: Show.ADWeb (never paused)",
                "  Collection: [1] 5.00 GB",
                "  Same size: [2] 5.00 GB",
                "  File overlap: true",
            ]
        );
    }

    #[test]
    fn retry_delay_grows_linearly() {
        let base = Duration::from_secs(5);
        assert_eq!(retry_delay(base, 1), Duration::from_secs(5));
        assert_eq!(retry_delay(base, 2), Duration::from_secs(10));
        assert_eq!(retry_delay(base, 3), Duration::from_secs(15));
    }

    #[test]
    fn incomplete_torrents_are_dropped() {
        let torrents = vec![
            RemoteTorrent {
                id: Some(1),
                name: Some("Show".to_string()),
                size_when_done: Some(10),
                files: None,
            },
            RemoteTorrent {
                id: None,
                name: Some("Show".to_string()),
                size_when_done: Some(10),
                files: None,
            },
        ];
        assert_eq!(to_items(torrents), vec![Item::new(1, "Show", 10)]);
    }
}
