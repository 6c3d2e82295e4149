//! Result cache integration tests
//!
//! Exercises the file-backed cache against a temporary directory.

use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use dialectic_engine::cache::{compute_key, ResultCache};
use dialectic_engine::result::{
    Contradiction, DialecticResult, ResearchProposal, ResultMetadata, ResultMode,
    RESULT_FORMAT_VERSION,
};

fn sample_result(synthesis: &str) -> DialecticResult {
    DialecticResult {
        query: "Is nuclear power green?".to_string(),
        mode: ResultMode::Synthesis,
        thesis: "Nuclear power is low-carbon.".to_string(),
        antithesis: "CONTRADICTION: Waste storage is unsolved".to_string(),
        synthesis: synthesis.to_string(),
        contradictions: vec![Contradiction {
            description: "Waste storage is unsolved".to_string(),
            evidence: None,
        }],
        research_proposals: vec![ResearchProposal {
            description: "Compare lifecycle emissions".to_string(),
            testable_prediction: Some("Below 20 gCO2/kWh".to_string()),
        }],
        metadata: ResultMetadata {
            thesis_time_ms: 12,
            antithesis_time_ms: 34,
            synthesis_time_ms: Some(56),
            total_time_ms: 110,
            backend_provider: Some("langbase".to_string()),
            backend_model: Some("openai:gpt-4o-mini".to_string()),
            debug: None,
            errors: vec![],
        },
        timestamp: Some("2026-10-18T12:00:00+00:00".to_string()),
        trace: None,
    }
}

fn key_for(query: &str) -> String {
    compute_key(
        query,
        "openai:gpt-4o-mini",
        "langbase:openai:gpt-4o-mini",
        RESULT_FORMAT_VERSION,
        2000,
        false,
    )
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);
    let key = key_for("Is nuclear power green?");
    let result = sample_result("It depends on waste policy.");

    cache.save(&key, &result).await.unwrap();
    let loaded = cache.load(&key).await.unwrap();

    assert_eq!(loaded, result);
}

#[tokio::test]
async fn test_missing_entry_is_none() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);

    assert!(cache.load(&key_for("never saved")).await.is_none());
}

#[tokio::test]
async fn test_save_creates_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let cache = ResultCache::with_directory(&nested, None);
    let key = key_for("q");

    cache.save(&key, &sample_result("s")).await.unwrap();

    assert!(nested.join(format!("{}.json", key)).exists());
}

#[tokio::test]
async fn test_corrupted_entry_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);
    let key = key_for("q");

    std::fs::write(cache.entry_path(&key).unwrap(), "{ not json").unwrap();

    assert!(cache.load(&key).await.is_none());
}

#[tokio::test]
async fn test_entry_of_wrong_shape_is_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);
    let key = key_for("q");

    std::fs::write(cache.entry_path(&key).unwrap(), r#"{"query": 42}"#).unwrap();

    assert!(cache.load(&key).await.is_none());
}

#[tokio::test]
async fn test_ttl_expiry() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), Some(Duration::from_secs(1)));
    let key = key_for("q");

    cache.save(&key, &sample_result("s")).await.unwrap();
    assert!(cache.load(&key).await.is_some());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(cache.load(&key).await.is_none());
}

#[tokio::test]
async fn test_overwrite_last_writer_wins() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);
    let key = key_for("q");

    cache.save(&key, &sample_result("first")).await.unwrap();
    cache.save(&key, &sample_result("second")).await.unwrap();

    assert_eq!(cache.load(&key).await.unwrap().synthesis, "second");
}

#[tokio::test]
async fn test_save_leaves_no_temp_files() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);

    for query in ["a", "b", "c"] {
        cache
            .save(&key_for(query), &sample_result(query))
            .await
            .unwrap();
    }

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|n| n.ends_with(".json") && !n.starts_with('.')));
}

#[tokio::test]
async fn test_concurrent_saves_of_same_key() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);
    let key = key_for("q");

    let writes = (0..8).map(|i| {
        let cache = cache.clone();
        let key = key.clone();
        tokio::spawn(async move { cache.save(&key, &sample_result(&format!("v{}", i))).await })
    });
    for handle in writes.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    let loaded = cache.load(&key).await.unwrap();
    assert!(loaded.synthesis.starts_with('v'));
}

#[tokio::test]
async fn test_invalid_key_rejected_on_save() {
    let dir = TempDir::new().unwrap();
    let cache = ResultCache::with_directory(dir.path(), None);

    let err = cache.save("../escape", &sample_result("s")).await.unwrap_err();
    assert!(err.to_string().contains("Invalid cache key"));
}
