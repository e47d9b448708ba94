//! Structured reading cache.
//!
//! Entries are JSON envelopes keyed by date:
//!
//! ```json
//! {
//!   "format_version": "1.0",
//!   "date": "08/28/2026",
//!   "cached_at": "2026-08-28T06:00:00+00:00",
//!   "Family": [ ...passages... ],
//!   "Secret": [ ...passages... ]
//! }
//! ```
//!
//! Reads degrade, writes raise: any failure on the read path (missing
//! entry, bad JSON, unknown format version, invalid passages) is logged
//! and treated as a cache miss, while failures on the write path
//! propagate. Individual corrupt passages inside an otherwise valid
//! envelope are skipped, not fatal.
//!
//! When a date has no structured entry but a legacy string-format entry
//! exists, the read path migrates it in place and re-reads.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::error::LectioError;
use crate::memo::ComputeCache;
use crate::migrate::migrate_legacy_cache;
use crate::models::BiblePassage;
use crate::readings::{DailyReadings, Reading};
use crate::store::{LocalStore, Store};
use crate::store_s3::S3Store;

pub const FORMAT_VERSION: &str = "1.0";
const MAX_LOGGED_ERRORS: usize = 5;

/// Canonical cache key for a date's structured readings.
pub fn structured_cache_key(date: NaiveDate) -> String {
    format!(
        "mcheyne_structured_{}_{:02}_{:02}.json",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Cache key used by the legacy string-format entries.
pub fn legacy_cache_key(date: NaiveDate) -> String {
    format!(
        "mcheyne_readings_{}_{:02}_{:02}.json",
        date.year(),
        date.month(),
        date.day()
    )
}

/// Reading cache over a local store with an optional S3 mirror.
pub struct ReadingCache {
    local: LocalStore,
    s3: Option<S3Store>,
    compute: Option<ComputeCache>,
}

impl ReadingCache {
    pub fn new(local: LocalStore, s3: Option<S3Store>) -> Self {
        Self {
            local,
            s3,
            compute: None,
        }
    }

    /// Attach an in-process memo of parsed entries, so repeated loads of
    /// the same date skip store and parse work.
    pub fn with_compute_cache(mut self, compute: ComputeCache) -> Self {
        self.compute = Some(compute);
        self
    }

    /// Build a cache from the application config. S3 is attached only
    /// when configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let local = LocalStore::new(config.cache.dir.clone())?;
        let s3 = match config.s3 {
            Some(ref s3_config) => Some(S3Store::new(s3_config.clone())?),
            None => None,
        };
        Ok(Self::new(local, s3))
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Read raw bytes for a key: S3 first when configured, then local.
    /// Backend errors are logged and treated as absence.
    pub(crate) async fn fetch_bytes(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(ref s3) = self.s3 {
            match s3.get(key).await {
                Ok(Some(bytes)) => return Some(bytes),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(key, store = s3.name(), error = %err,
                        "cache read failed, trying local");
                }
            }
        }
        match self.local.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key, store = self.local.name(), error = %err, "cache read failed");
                None
            }
        }
    }

    /// Load the structured readings for a date, or `None` on any miss.
    pub async fn load_structured(&self, date: NaiveDate) -> Option<DailyReadings> {
        let key = structured_cache_key(date);

        if let Some(ref compute) = self.compute {
            if let Some(value) = compute.get(&key) {
                if let Ok(readings) = serde_json::from_value::<DailyReadings>(value) {
                    return Some(readings);
                }
            }
        }

        let mut bytes = self.fetch_bytes(&key).await;
        if bytes.is_none() {
            match migrate_legacy_cache(self, date).await {
                Ok(true) => {
                    tracing::info!(date = %date, "migrated legacy cache entry");
                    bytes = self.fetch_bytes(&key).await;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(date = %date, error = %err, "legacy cache migration failed");
                }
            }
        }
        let bytes = bytes?;

        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!(key, error = %err, "invalid JSON in cache entry");
                return None;
            }
        };
        let readings = match parse_cache_data(&value) {
            Ok(r) => r,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache entry rejected");
                return None;
            }
        };
        if readings.is_empty() {
            return None;
        }

        if let Some(ref compute) = self.compute {
            if let Ok(value) = serde_json::to_value(&readings) {
                compute.set(&key, value);
            }
        }
        Some(readings)
    }

    /// Whether a structured entry for the date exists in the local store.
    pub async fn has_structured(&self, date: NaiveDate) -> bool {
        self.local
            .exists(&structured_cache_key(date))
            .await
            .unwrap_or(false)
    }

    /// Persist structured readings for a date: atomic local write, then
    /// the S3 mirror when configured. Strict; errors propagate.
    pub async fn save_structured(&self, date: NaiveDate, readings: &DailyReadings) -> Result<()> {
        let envelope = build_envelope(date, readings)?;
        let bytes = serde_json::to_vec_pretty(&envelope).context("failed to encode cache entry")?;
        let key = structured_cache_key(date);

        self.local.put(&key, &bytes).await?;
        if let Some(ref s3) = self.s3 {
            s3.put(&key, &bytes).await?;
        }

        if let Some(ref compute) = self.compute {
            if let Ok(value) = serde_json::to_value(readings) {
                compute.set(&key, value);
            }
        }
        tracing::info!(key, family = readings.family.len(), secret = readings.secret.len(),
            "saved structured readings");
        Ok(())
    }

    /// Prune local cache files older than `days_to_keep` days, by both
    /// the structured and legacy key prefixes. Returns how many files
    /// were removed.
    pub fn clear_old_entries(&self, days_to_keep: u32) -> Result<usize> {
        let now = std::time::SystemTime::now();
        let max_age = std::time::Duration::from_secs(u64::from(days_to_keep) * 24 * 60 * 60);
        let mut removed = 0;

        for prefix in ["mcheyne_readings_", "mcheyne_structured_"] {
            for key in self.local.list_keys(prefix)? {
                if !key.ends_with(".json") {
                    continue;
                }
                let path = self.local.dir().join(&key);
                let modified = std::fs::metadata(&path).and_then(|m| m.modified());
                let age = match modified {
                    Ok(t) => now.duration_since(t).unwrap_or_default(),
                    Err(err) => {
                        tracing::warn!(key, error = %err, "could not stat cache file");
                        continue;
                    }
                };
                if age > max_age {
                    self.local.remove(&key)?;
                    tracing::info!(key, "removed old cache file");
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// Decode a cache envelope, skipping invalid passages.
///
/// The top level must be an object with `Family` and `Secret` arrays and
/// a supported `format_version` (absent means `"1.0"`). Passages that
/// fail to deserialize or validate are skipped; the first few failures
/// are logged.
pub fn parse_cache_data(value: &Value) -> crate::error::Result<DailyReadings> {
    let obj = value
        .as_object()
        .ok_or_else(|| LectioError::Cache("cache entry is not an object".to_string()))?;

    let format_version = obj
        .get("format_version")
        .and_then(Value::as_str)
        .unwrap_or(FORMAT_VERSION);
    if format_version != FORMAT_VERSION {
        return Err(LectioError::Cache(format!(
            "unsupported cache format version {format_version}"
        )));
    }

    let mut readings = DailyReadings::default();
    let mut errors: Vec<String> = Vec::new();

    for (category, target) in [
        ("Family", &mut readings.family),
        ("Secret", &mut readings.secret),
    ] {
        let entries = obj
            .get(category)
            .and_then(Value::as_array)
            .ok_or_else(|| LectioError::Cache(format!("missing or invalid '{category}' array")))?;

        for (i, entry) in entries.iter().enumerate() {
            match serde_json::from_value::<BiblePassage>(entry.clone()) {
                Ok(passage) => match passage.validate() {
                    Ok(()) => target.push(Reading::Structured(passage)),
                    Err(err) => errors.push(format!("{category}[{i}]: {err}")),
                },
                Err(err) => errors.push(format!("{category}[{i}]: {err}")),
            }
        }
    }

    for error in errors.iter().take(MAX_LOGGED_ERRORS) {
        tracing::warn!(error = %error, "skipped invalid cached passage");
    }
    if errors.len() > MAX_LOGGED_ERRORS {
        tracing::warn!(
            additional = errors.len() - MAX_LOGGED_ERRORS,
            "more cached passages failed validation"
        );
    }

    Ok(readings)
}

fn build_envelope(date: NaiveDate, readings: &DailyReadings) -> Result<Value> {
    let passages = |items: &[Reading]| -> Result<Vec<Value>> {
        items
            .iter()
            .map(|reading| match reading {
                Reading::Structured(passage) => {
                    serde_json::to_value(passage).context("failed to encode passage")
                }
                Reading::Legacy(_) => {
                    anyhow::bail!("legacy readings cannot be written to the structured cache")
                }
            })
            .collect()
    };

    Ok(serde_json::json!({
        "format_version": FORMAT_VERSION,
        "date": format!("{:02}/{:02}/{}", date.month(), date.day(), date.year()),
        "cached_at": Utc::now().to_rfc3339(),
        "Family": passages(&readings.family)?,
        "Secret": passages(&readings.secret)?,
    }))
}
