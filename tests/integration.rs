//! End-to-end tests over the parse, highlight, cache, and migration
//! pipeline, using a temporary directory as the local store.

use chrono::NaiveDate;
use tempfile::TempDir;

use lectio::cache::{legacy_cache_key, structured_cache_key, ReadingCache};
use lectio::extract::parse_passage_text;
use lectio::memo::ComputeCache;
use lectio::migrate::migrate_legacy_cache;
use lectio::models::HighlightPosition;
use lectio::readings::{date_with_offset, load_with_fallback, DailyReadings, Reading};
use lectio::store::{LocalStore, Store};

const GENESIS_TEXT: &str = "1 In the beginning God created the heavens and the earth. \
    2 The earth was without form, and void; and darkness was on the face of the deep. \
    3 Then God said, \"Let there be light\"; and there was light.";

const MATTHEW_TEXT: &str = "1 The book of the genealogy of Jesus Christ, \
    the Son of David, the Son of Abraham. \
    2 Abraham begot Isaac, Isaac begot Jacob, and Jacob begot Judah and his brothers.";

fn cache_in(dir: &TempDir) -> ReadingCache {
    ReadingCache::new(LocalStore::new(dir.path()).unwrap(), None)
}

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
}

#[tokio::test]
async fn parse_highlight_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);

    let mut family = parse_passage_text(GENESIS_TEXT, "Genesis 1:1-3", "NKJV").unwrap();
    assert_eq!(family.total_verses(), 3);
    family
        .add_highlight(
            HighlightPosition::new(0, 0),
            HighlightPosition::new(0, 3),
        )
        .unwrap();
    // repeated span bumps the count instead of duplicating
    family
        .add_highlight(
            HighlightPosition::new(0, 0),
            HighlightPosition::new(0, 3),
        )
        .unwrap();

    let secret = parse_passage_text(MATTHEW_TEXT, "Matthew 1:1-2", "NKJV").unwrap();
    let readings = DailyReadings {
        family: vec![Reading::Structured(family)],
        secret: vec![Reading::Structured(secret)],
    };

    cache.save_structured(test_date(), &readings).await.unwrap();
    let loaded = cache.load_structured(test_date()).await.unwrap();

    let passage = loaded.family[0].as_structured().unwrap();
    assert_eq!(passage.reference, "Genesis 1:1-3");
    assert_eq!(passage.highlights.len(), 1);
    assert_eq!(passage.highlights[0].highlight_count, 2);
    assert_eq!(
        passage.highlights[0].get_highlighted_text(passage).unwrap(),
        "In the beginning God"
    );

    let secret = loaded.secret[0].as_structured().unwrap();
    assert_eq!(secret.total_verses(), 2);
    assert_eq!(secret.verses[0].verse, 1);
}

#[tokio::test]
async fn legacy_entry_migrates_on_read() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let date = test_date();

    let legacy = serde_json::json!({
        "Family": [format!("\n📖 Genesis 1:1-3 (NKJV)\n──────────────────\n{GENESIS_TEXT}\n")],
        "Secret": [format!("\n📖 Matthew 1:1-2 (NKJV)\n──────────────────\n{MATTHEW_TEXT}\n")],
    });
    cache
        .local()
        .put(&legacy_cache_key(date), &serde_json::to_vec(&legacy).unwrap())
        .await
        .unwrap();

    // load path performs the migration transparently
    let readings = cache.load_structured(date).await.unwrap();
    assert_eq!(readings.family.len(), 1);
    assert_eq!(readings.secret.len(), 1);
    assert_eq!(
        readings.family[0].as_structured().unwrap().total_verses(),
        3
    );

    // the structured entry now exists on disk; the legacy one remains
    assert!(dir.path().join(structured_cache_key(date)).exists());
    assert!(dir.path().join(legacy_cache_key(date)).exists());

    // explicit migration is now a no-op
    assert!(!migrate_legacy_cache(&cache, date).await.unwrap());
}

#[tokio::test]
async fn fallback_serves_an_adjacent_day() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);

    let passage = parse_passage_text(GENESIS_TEXT, "Genesis 1:1-3", "NKJV").unwrap();
    let readings = DailyReadings {
        family: vec![Reading::Structured(passage)],
        secret: vec![],
    };

    // only yesterday is cached
    let yesterday = date_with_offset(-1);
    cache.save_structured(yesterday, &readings).await.unwrap();

    let (date, found) = load_with_fallback(&cache, 0).await;
    assert_eq!(date, yesterday);
    assert!(found.is_some());
}

#[tokio::test]
async fn fallback_reports_a_miss() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let (date, found) = load_with_fallback(&cache, 30).await;
    assert_eq!(date, date_with_offset(30));
    assert!(found.is_none());
}

#[tokio::test]
async fn corrupt_passages_degrade_not_fail() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir);
    let date = test_date();

    let good = parse_passage_text(GENESIS_TEXT, "Genesis 1:1-3", "NKJV").unwrap();
    let envelope = serde_json::json!({
        "format_version": "1.0",
        "date": "08/28/2026",
        "cached_at": "2026-08-28T06:00:00+00:00",
        "Family": [serde_json::to_value(&good).unwrap(), {"reference": ""}],
        "Secret": [],
    });
    cache
        .local()
        .put(
            &structured_cache_key(date),
            &serde_json::to_vec(&envelope).unwrap(),
        )
        .await
        .unwrap();

    let readings = cache.load_structured(date).await.unwrap();
    assert_eq!(readings.family.len(), 1);
}

#[tokio::test]
async fn compute_cache_survives_store_loss() {
    let dir = TempDir::new().unwrap();
    let cache = cache_in(&dir).with_compute_cache(ComputeCache::new());
    let date = test_date();

    let passage = parse_passage_text(GENESIS_TEXT, "Genesis 1:1-3", "NKJV").unwrap();
    let readings = DailyReadings {
        family: vec![Reading::Structured(passage)],
        secret: vec![],
    };
    cache.save_structured(date, &readings).await.unwrap();
    assert!(cache.load_structured(date).await.is_some());

    std::fs::remove_file(dir.path().join(structured_cache_key(date))).unwrap();
    assert!(cache.load_structured(date).await.is_some());
}

#[tokio::test]
async fn typography_applies_through_the_pipeline() {
    let text = "1 The word of the Lord came to me, saying, \"Before I formed you \
        in the womb I knew you.\" 2 Then said I: \"Ah, Lord God! Behold, I cannot speak.\"";
    let passage = parse_passage_text(text, "Jeremiah 1:1-2", "NKJV").unwrap();

    // curly quotes and small-caps divine name in an Old Testament book
    assert!(passage.verses[0].text.contains('\u{201C}'));
    assert!(passage.verses[0].text.contains("L\u{1D0F}\u{280}\u{1D05}"));
}
