use std::collections::HashSet;
use std::fs;

use metrics_util::debugging::DebuggingRecorder;
use quire::application::loader::{ContentLoader, LoadOptions};
use quire::cache::{BoundedCache, CacheConfig, ManualClock};
use quire::config::ContentSettings;
use quire::domain::content::ContentKind;
use std::time::Duration;

#[tokio::test]
async fn cache_and_loader_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    // hit, miss, evict
    let mut cache = BoundedCache::from_config("metrics", &CacheConfig::with_capacity(1))
        .expect("valid config");
    assert!(cache.get("first").is_none());
    cache.set("first", 1);
    assert_eq!(cache.get("first"), Some(&1));
    cache.set("second", 2);

    // expiry
    let clock = ManualClock::new();
    let config = CacheConfig::with_capacity(4).with_ttl(Duration::from_millis(10));
    let mut expiring =
        BoundedCache::with_clock("metrics_ttl", &config, clock.clone()).expect("valid config");
    expiring.set("key", "value");
    clock.advance(Duration::from_millis(10));
    assert!(expiring.get("key").is_none());

    // loader skip + latency
    let dir = tempfile::tempdir().expect("tempdir");
    let blog = dir.path().join("blog");
    fs::create_dir_all(&blog).expect("blog dir");
    fs::write(blog.join("ok.md"), "---\ntitle: Ok\n---\nbody\n").expect("write");
    fs::write(blog.join("broken.md"), "---\ntitle: [unclosed\n").expect("write");

    let loader = ContentLoader::new(&ContentSettings::under(dir.path()));
    let report = loader
        .load_all(ContentKind::Blog, &LoadOptions::default())
        .await
        .expect("load succeeds");
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.warnings.len(), 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "quire_cache_hit_total",
        "quire_cache_miss_total",
        "quire_cache_evict_total",
        "quire_cache_expired_total",
        "quire_loader_skipped_total",
        "quire_loader_records",
        "quire_loader_load_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
