use std::fs;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;

use torrent_dedupe::dedupe::{ClassifiedGroup, Report};

use crate::config::Config;
use crate::stats::PauseStats;

/// Simple file logger for dedupe runs with buffered writes
pub struct FileLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileLogger {
    /// Create a new file logger, writing to ~/logs/torrent-dedupe/tdedupe_<timestamp>.log
    pub(crate) fn new() -> Result<Self> {
        let log_dir = torrent_dedupe::config::LOG_DIR
            .as_deref()
            .context("Failed to get home directory")?;
        Self::create(log_dir)
    }

    /// Create a new file logger in the given directory.
    pub(crate) fn create(log_dir: &Path) -> Result<Self> {
        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let log_path = log_dir.join(format!("tdedupe_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: log_path,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Log when starting the program
    pub(crate) fn log_init(&mut self, config: &Config) {
        let scheme = if config.https { "https" } else { "http" };
        let _ = writeln!(
            self.writer,
            "[{}] INIT {scheme}://{}:{}",
            Self::timestamp(),
            config.host,
            config.port
        );
        if config.has_credentials() {
            let _ = writeln!(self.writer, "  username: {}", config.username);
        }
        if !config.suffixes.is_empty() {
            let _ = writeln!(self.writer, "  suffixes: {:?}", config.suffixes);
        }
        let _ = writeln!(self.writer, "  size_tolerance: {}", config.thresholds.size_tolerance);
        let _ = writeln!(self.writer, "  min_match_ratio: {}", config.thresholds.min_match_ratio);
        if !config.marker_patterns.is_empty() {
            let _ = writeln!(self.writer, "  marker_patterns: {:?}", config.marker_patterns);
        }
        let _ = writeln!(self.writer, "  retries: {}", config.retries);
        let _ = writeln!(self.writer, "  dryrun: {}", config.dryrun);
        let _ = writeln!(self.writer, "  verbose: {}", config.verbose);
        let _ = self.writer.flush();
    }

    /// Log one actionable group
    pub(crate) fn log_group(&mut self, group: &ClassifiedGroup) {
        let collection = group
            .collection
            .as_ref()
            .map_or_else(String::new, |c| format!("{} ({})", c.id, c.size_bytes));
        let _ = writeln!(
            self.writer,
            "[{}] GROUP   \"{}\" | collection: {collection} | duplicates: {:?}",
            Self::timestamp(),
            group.name,
            group.pause_ids()
        );
        let _ = self.writer.flush();
    }

    /// Log a pause request result
    pub(crate) fn log_pause(&mut self, name: &str, ids: &[i64], error: Option<&str>) {
        match error {
            None => {
                let _ = writeln!(
                    self.writer,
                    "[{}] PAUSED  \"{name}\" | {ids:?}",
                    Self::timestamp()
                );
            }
            Some(error) => {
                let _ = writeln!(
                    self.writer,
                    "[{}] ERROR   \"{name}\" | {ids:?} | {error}",
                    Self::timestamp()
                );
            }
        }
        let _ = self.writer.flush();
    }

    /// Log final statistics
    pub(crate) fn log_summary(&mut self, report: &Report, stats: Option<&PauseStats>) {
        let _ = writeln!(self.writer, "[{}] STATISTICS", Self::timestamp());
        let _ = writeln!(self.writer, "  Groups processed:     {}", report.processed);
        let _ = writeln!(self.writer, "  Actionable:           {}", report.actionable);
        let _ = writeln!(self.writer, "  Same size only:       {}", report.same_size);
        let _ = writeln!(self.writer, "  Only same size eps:   {}", report.only_same_size_episodes);
        let _ = writeln!(self.writer, "  Without episodes:     {}", report.without_episodes);
        let _ = writeln!(self.writer, "  Skipped:              {}", report.skipped());
        let _ = writeln!(self.writer, "    - Singletons:           {}", report.singletons);
        let _ = writeln!(self.writer, "    - Collection missing:   {}", report.collection_unavailable);
        let _ = writeln!(self.writer, "  Distinct episodes:    {}", report.distinct_episodes);
        let _ = writeln!(self.writer, "  Unavailable episodes: {}", report.unavailable_episodes);
        if let Some(stats) = stats {
            let _ = writeln!(self.writer, "  Torrents paused:      {}", stats.paused_count());
            let _ = writeln!(self.writer, "  Torrents failed:      {}", stats.failed_count());
        }
        let _ = writeln!(self.writer, "[{}] END", Self::timestamp());
        let _ = self.writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pause_entries_to_log_file() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let log_dir = dir.path().join("logs");

        let mut logger = FileLogger::create(&log_dir).expect("should create logger");
        logger.log_pause("Show.ADWeb", &[2, 3], None);
        logger.log_pause("Other.ADWeb", &[5], Some("timeout"));

        let content = fs::read_to_string(logger.path()).expect("should read log");
        assert!(content.contains("PAUSED  \"Show.ADWeb\" | [2, 3]"));
        assert!(content.contains("ERROR   \"Other.ADWeb\" | [5] | timeout"));
        assert!(
            logger
                .path()
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("tdedupe_") && name.ends_with(".log"))
        );
    }

    #[test]
    fn summary_includes_report_counts() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let mut logger = FileLogger::create(dir.path()).expect("should create logger");

        let mut report = Report::default();
        report.processed = 3;
        report.actionable = 1;
        report.collection_unavailable = 1;
        report.distinct_episodes = 2;
        report.unavailable_episodes = 4;
        logger.log_summary(&report, None);

        let content = fs::read_to_string(logger.path()).expect("should read log");
        assert!(content.contains("Groups processed:     3"));
        assert!(content.contains("Actionable:           1"));
        assert!(content.contains("- Collection missing:   1"));
        assert!(content.contains("Distinct episodes:    2"));
        assert!(content.contains("Unavailable episodes: 4"));
        assert!(content.contains("END"));
    }
}
