use std::collections::HashMap;

use anyhow::{Result, anyhow};

use torrent_dedupe::dedupe::{Classifier, FileEntry, Item, ManifestSource, MarkerExtractor, NameGroups};
use torrent_dedupe::print_warning;

/// Fetches the file list of one torrent from the daemon.
pub trait ManifestFetcher {
    async fn fetch_manifest(&mut self, id: i64) -> Result<Vec<FileEntry>>;
}

/// File manifests fetched ahead of classification.
///
/// Fetch failures are stored so the classifier sees them as unavailable manifests.
#[derive(Debug, Default)]
pub struct ManifestCache {
    manifests: HashMap<i64, Vec<FileEntry>>,
    errors: HashMap<i64, String>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch file lists for every group the classifier will compare.
    ///
    /// Groups are visited in name order and the collection is fetched first.
    /// If the collection file list fails, the group is skipped without fetching its episodes.
    pub async fn prefetch<F: ManifestFetcher, M: MarkerExtractor>(
        fetcher: &mut F,
        classifier: &Classifier<M>,
        groups: &NameGroups,
    ) -> Self {
        let mut cache = Self::new();
        let mut names: Vec<&String> = groups.keys().collect();
        names.sort();

        for name in names {
            let Some(candidate) = groups.get(name).and_then(|items| classifier.candidate(items)) else {
                continue;
            };
            if !cache.fetch(fetcher, candidate.collection.id, name).await {
                continue;
            }
            for episode in &candidate.episodes {
                cache.fetch(fetcher, episode.id, name).await;
            }
        }

        cache
    }

    /// Fetch one file list unless it is already cached.
    ///
    /// Returns true if the file list is available.
    async fn fetch<F: ManifestFetcher>(&mut self, fetcher: &mut F, id: i64, name: &str) -> bool {
        if !self.contains(id) {
            let result = fetcher.fetch_manifest(id).await;
            if let Err(ref error) = result {
                print_warning!("Failed to get file list for torrent ID {id} ({name}): {error:#}");
            }
            self.insert(id, result);
        }
        self.manifests.contains_key(&id)
    }

    /// Store the result of fetching the manifest for one torrent.
    pub fn insert(&mut self, id: i64, result: Result<Vec<FileEntry>>) {
        match result {
            Ok(files) => {
                self.errors.remove(&id);
                self.manifests.insert(id, files);
            }
            Err(error) => {
                self.manifests.remove(&id);
                self.errors.insert(id, format!("{error:#}"));
            }
        }
    }

    /// Cached files for a torrent, empty if the manifest was unavailable.
    pub fn files(&self, id: i64) -> &[FileEntry] {
        self.manifests.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.manifests.contains_key(&id) || self.errors.contains_key(&id)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

impl ManifestSource for ManifestCache {
    fn file_manifest(&mut self, item: &Item) -> Result<Vec<FileEntry>> {
        if let Some(files) = self.manifests.get(&item.id) {
            return Ok(files.clone());
        }
        match self.errors.get(&item.id) {
            Some(error) => Err(anyhow!("{error}")),
            None => Err(anyhow!("File list not fetched for torrent ID {}", item.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use torrent_dedupe::dedupe::{Thresholds, group_by_name};

    use super::*;

    /// Serves file lists from a map and records every request.
    struct MapFetcher {
        manifests: HashMap<i64, Vec<FileEntry>>,
        requests: Vec<i64>,
    }

    impl ManifestFetcher for MapFetcher {
        async fn fetch_manifest(&mut self, id: i64) -> Result<Vec<FileEntry>> {
            self.requests.push(id);
            self.manifests
                .get(&id)
                .cloned()
                .ok_or_else(|| anyhow!("Torrent ID {id} not found"))
        }
    }

    #[tokio::test]
    async fn prefetch_skips_episodes_when_collection_fails() {
        let items = vec![
            Item::new(1, "Alpha", 3000),
            Item::new(2, "Alpha", 900),
            Item::new(3, "Beta", 5000),
            Item::new(4, "Beta", 800),
            Item::new(5, "Beta", 700),
            Item::new(6, "Gamma", 100),
            Item::new(7, "Same", 400),
            Item::new(8, "Same", 400),
        ];
        let mut fetcher = MapFetcher {
            manifests: HashMap::from([
                (1, vec![FileEntry::new("Alpha.S01E01.mkv")]),
                (2, vec![FileEntry::new("Alpha.S01E01.mkv")]),
                (4, vec![FileEntry::new("Beta.S01E01.mkv")]),
            ]),
            requests: Vec::new(),
        };
        let classifier = Classifier::new(Thresholds::default());

        let cache = ManifestCache::prefetch(&mut fetcher, &classifier, &group_by_name(items)).await;

        assert_eq!(fetcher.requests, vec![1, 2, 3]);
        assert_eq!(cache.files(2).len(), 1);
        assert!(cache.contains(3));
        assert!(!cache.contains(4));
        assert_eq!(cache.error_count(), 1);
    }

    #[test]
    fn returns_cached_files() {
        let mut cache = ManifestCache::new();
        cache.insert(1, Ok(vec![FileEntry::new("Show/Show.S01E01.mkv")]));

        let files = cache
            .file_manifest(&Item::new(1, "Show", 100))
            .expect("should have manifest");
        assert_eq!(files, vec![FileEntry::new("Show/Show.S01E01.mkv")]);
        assert_eq!(cache.files(1).len(), 1);
        assert!(cache.contains(1));
    }

    #[test]
    fn stored_failure_is_returned_as_error() {
        let mut cache = ManifestCache::new();
        cache.insert(2, Err(anyhow!("operation timed out")));

        let error = cache
            .file_manifest(&Item::new(2, "Show", 100))
            .expect_err("should fail");
        assert!(error.to_string().contains("timed out"));
        assert!(cache.files(2).is_empty());
        assert_eq!(cache.error_count(), 1);
    }

    #[test]
    fn unknown_item_is_error() {
        let mut cache = ManifestCache::new();
        assert!(cache.file_manifest(&Item::new(3, "Show", 100)).is_err());
        assert!(!cache.contains(3));
    }

    #[test]
    fn later_success_replaces_failure() {
        let mut cache = ManifestCache::new();
        cache.insert(4, Err(anyhow!("connection reset")));
        cache.insert(4, Ok(Vec::new()));

        assert!(cache.file_manifest(&Item::new(4, "Show", 100)).is_ok());
        assert_eq!(cache.error_count(), 0);
    }
}
