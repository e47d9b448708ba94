//! Lazy migration of legacy cache entries.
//!
//! The previous cache format stored each reading as a display string:
//!
//! ```text
//! 📖 Genesis 1:1-5 (NKJV)
//! ──────────────────────
//! In the beginning God created the heavens and the earth. ...
//! ```
//!
//! Migration runs on the read path when a date has a legacy entry but no
//! structured one. Each legacy string is split into header and body, the
//! body is re-parsed into verses, and the result is written back under
//! the structured key. The legacy entry itself is left in place; pruning
//! removes it eventually.

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::Value;

use crate::cache::{legacy_cache_key, ReadingCache};
use crate::extract::parse_passage_list;
use crate::readings::{DailyReadings, Reading};

const DEFAULT_VERSION: &str = "NKJV";

/// Convert a date's legacy cache entry to the structured format, if one
/// exists. Returns whether a migration was performed.
pub async fn migrate_legacy_cache(cache: &ReadingCache, date: NaiveDate) -> Result<bool> {
    if cache.has_structured(date).await {
        return Ok(false);
    }
    let bytes = match cache.fetch_bytes(&legacy_cache_key(date)).await {
        Some(bytes) => bytes,
        None => return Ok(false),
    };

    let value: Value = match serde_json::from_slice(&bytes) {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(date = %date, error = %err, "legacy cache entry is not valid JSON");
            return Ok(false);
        }
    };
    let Some(obj) = value.as_object() else {
        tracing::warn!(date = %date, "legacy cache entry is not an object");
        return Ok(false);
    };

    let mut readings = DailyReadings::default();
    for (category, target) in [
        ("Family", &mut readings.family),
        ("Secret", &mut readings.secret),
    ] {
        let entries = match obj.get(category).and_then(Value::as_array) {
            Some(entries) => entries,
            None => continue,
        };
        for entry in entries {
            let Some(text) = entry.as_str() else {
                tracing::warn!(category, "skipping non-string legacy entry");
                continue;
            };
            match parse_legacy_entry(text) {
                Some(parsed) => {
                    let passages = parse_passage_list(
                        &[(parsed.reference, parsed.body)],
                        &parsed.version,
                    );
                    target.extend(passages.into_iter().map(Reading::Structured));
                }
                None => {
                    tracing::warn!(category, "skipping unparseable legacy entry");
                }
            }
        }
    }

    if readings.is_empty() {
        return Ok(false);
    }
    cache.save_structured(date, &readings).await?;
    Ok(true)
}

struct LegacyEntry {
    reference: String,
    version: String,
    body: String,
}

/// Split a legacy display string into reference, version, and body text.
///
/// The header is the first non-empty line, with an optional `📖 ` prefix
/// and a trailing `(VERSION)`. Separator lines made entirely of rule
/// characters are dropped from the body.
fn parse_legacy_entry(text: &str) -> Option<LegacyEntry> {
    let mut lines = text.lines().skip_while(|line| line.trim().is_empty());
    let header = lines.next()?.trim();
    let header = header.strip_prefix("📖").unwrap_or(header).trim();

    let (reference, version) = match (header.rfind('('), header.ends_with(')')) {
        (Some(open), true) => {
            let version = header[open + 1..header.len() - 1].trim();
            let version = if version.is_empty() {
                DEFAULT_VERSION
            } else {
                version
            };
            (header[..open].trim(), version)
        }
        _ => (header, DEFAULT_VERSION),
    };

    let body: Vec<&str> = lines
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_separator_line(line))
        .collect();
    let body = body.join("\n");

    if reference.is_empty() || body.is_empty() {
        return None;
    }
    Some(LegacyEntry {
        reference: reference.to_string(),
        version: version.to_string(),
        body,
    })
}

fn is_separator_line(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| matches!(c, '─' | '-' | '_' | '='))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::structured_cache_key;
    use crate::store::{LocalStore, Store};
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 28).unwrap()
    }

    fn legacy_text(reference: &str, body: &str) -> String {
        format!("\n📖 {reference} (NKJV)\n──────────────────\n{body}\n")
    }

    async fn cache_with_legacy(dir: &TempDir, family: &[String]) -> ReadingCache {
        let cache = ReadingCache::new(LocalStore::new(dir.path()).unwrap(), None);
        let entry = serde_json::json!({
            "Family": family,
            "Secret": [],
        });
        cache
            .local()
            .put(
                &legacy_cache_key(date()),
                &serde_json::to_vec(&entry).unwrap(),
            )
            .await
            .unwrap();
        cache
    }

    #[test]
    fn test_parse_legacy_entry() {
        let text = legacy_text("Genesis 1:1-2", "1 In the beginning. 2 The earth was void.");
        let parsed = parse_legacy_entry(&text).unwrap();
        assert_eq!(parsed.reference, "Genesis 1:1-2");
        assert_eq!(parsed.version, "NKJV");
        assert_eq!(parsed.body, "1 In the beginning. 2 The earth was void.");
    }

    #[test]
    fn test_parse_legacy_entry_without_version() {
        let parsed = parse_legacy_entry("📖 Psalm 23\n----\nThe Lord is my shepherd.").unwrap();
        assert_eq!(parsed.reference, "Psalm 23");
        assert_eq!(parsed.version, "NKJV");
    }

    #[test]
    fn test_parse_legacy_entry_rejects_empty_body() {
        assert!(parse_legacy_entry("📖 Psalm 23 (NKJV)\n──────\n\n").is_none());
        assert!(parse_legacy_entry("").is_none());
    }

    #[test]
    fn test_separator_lines() {
        assert!(is_separator_line("──────"));
        assert!(is_separator_line("---"));
        assert!(is_separator_line("==="));
        assert!(!is_separator_line("- verse one"));
    }

    #[tokio::test]
    async fn test_migrate_writes_structured_entry() {
        let dir = TempDir::new().unwrap();
        let body = "1 In the beginning God created the heavens and the earth. \
                    2 The earth was without form, and void.";
        let cache =
            cache_with_legacy(&dir, &[legacy_text("Genesis 1:1-2", body)]).await;

        assert!(migrate_legacy_cache(&cache, date()).await.unwrap());
        assert!(dir.path().join(structured_cache_key(date())).exists());

        let readings = cache.load_structured(date()).await.unwrap();
        assert_eq!(readings.family.len(), 1);
        let passage = readings.family[0].as_structured().unwrap();
        assert_eq!(passage.reference, "Genesis 1:1-2");
        assert_eq!(passage.total_verses(), 2);
    }

    #[tokio::test]
    async fn test_migrate_without_legacy_entry() {
        let dir = TempDir::new().unwrap();
        let cache = ReadingCache::new(LocalStore::new(dir.path()).unwrap(), None);
        assert!(!migrate_legacy_cache(&cache, date()).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_skips_when_structured_exists() {
        let dir = TempDir::new().unwrap();
        let cache = cache_with_legacy(&dir, &[legacy_text("Genesis 1", "In the beginning.")]).await;
        cache
            .local()
            .put(&structured_cache_key(date()), b"{}")
            .await
            .unwrap();
        assert!(!migrate_legacy_cache(&cache, date()).await.unwrap());
    }

    #[tokio::test]
    async fn test_migrate_skips_unparseable_reference() {
        // the bad entry is dropped, the good one still migrates
        let dir = TempDir::new().unwrap();
        let cache = cache_with_legacy(
            &dir,
            &[
                legacy_text("Somewhere odd", "A reading with no usable reference."),
                legacy_text("Psalm 23:1", "The Lord is my shepherd; I shall not want."),
            ],
        )
        .await;
        assert!(migrate_legacy_cache(&cache, date()).await.unwrap());
        let readings = cache.load_structured(date()).await.unwrap();
        assert_eq!(readings.family.len(), 1);
        assert_eq!(readings.family[0].reference(), Some("Psalm 23:1"));
    }
}
