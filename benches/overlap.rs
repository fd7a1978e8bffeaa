use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use torrent_dedupe::dedupe::{
    Classifier, FileEntry, Item, RegexMarkerExtractor, Thresholds, analyze_overlap, group_by_name,
};

fn season_files(season: usize, episodes: usize) -> Vec<FileEntry> {
    (1..=episodes)
        .map(|episode| {
            FileEntry::new(format!(
                "Show.S{season:02}.1080p.ADWeb/Show.S{season:02}E{episode:02}.1080p.ADWeb.mkv"
            ))
        })
        .collect()
}

fn bench_analyze_overlap(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_overlap");
    let markers = RegexMarkerExtractor::default();

    for episodes in [10, 50, 200] {
        let collection = season_files(1, episodes);
        let episode = season_files(1, 1);
        group.bench_with_input(BenchmarkId::new("single_episode", episodes), &collection, |b, collection| {
            b.iter(|| black_box(analyze_overlap(collection, &episode, &markers, 0.5)));
        });
    }

    let collection = season_files(1, 100);
    let episode = season_files(2, 1);
    group.bench_function("marker_conflict_100", |b| {
        b.iter(|| black_box(analyze_overlap(&collection, &episode, &markers, 0.5)));
    });

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut manifests = std::collections::HashMap::new();
    let mut items = Vec::new();
    let mut id = 0;
    for show in 0..100 {
        let name = format!("Show{show}.ADWeb");
        id += 1;
        items.push(Item::new(id, name.clone(), 10_000_000));
        manifests.insert(id, season_files(1, 20));
        for episode in 1..=5_usize {
            id += 1;
            items.push(Item::new(id, name.clone(), 500_000));
            manifests.insert(
                id,
                vec![FileEntry::new(format!("Show.S01E{episode:02}.1080p.ADWeb.mkv"))],
            );
        }
    }
    let groups = group_by_name(items);
    let classifier = Classifier::new(Thresholds::default());

    c.bench_function("classify_100_groups", |b| {
        b.iter(|| {
            let mut source = manifests.clone();
            black_box(classifier.classify(&groups, &mut source))
        });
    });
}

criterion_group!(benches, bench_analyze_overlap, bench_classify);
criterion_main!(benches);
