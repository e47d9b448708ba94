//! Daily reading sets and date fallback.
//!
//! A day's readings come in two tracks, Family and Secret, each holding up
//! to two passages. A reading is either fully structured or a legacy
//! formatted string that predates the structured cache; rendering pattern
//! matches on the variant so partially migrated caches still display.

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::ReadingCache;
use crate::display::DisplayOptions;
use crate::models::BiblePassage;

/// One reading: structured passage or legacy display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Reading {
    Structured(BiblePassage),
    Legacy(String),
}

impl Reading {
    /// The passage reference when known. Legacy entries carry the
    /// reference only inside their header line.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Reading::Structured(passage) => Some(&passage.reference),
            Reading::Legacy(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&BiblePassage> {
        match self {
            Reading::Structured(passage) => Some(passage),
            Reading::Legacy(_) => None,
        }
    }
}

/// The Family and Secret reading tracks for one calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyReadings {
    pub family: Vec<Reading>,
    pub secret: Vec<Reading>,
}

impl DailyReadings {
    pub fn is_empty(&self) -> bool {
        self.family.is_empty() && self.secret.is_empty()
    }

    pub fn total_readings(&self) -> usize {
        self.family.len() + self.secret.len()
    }

    /// Section title for a reading, e.g. `"Family 1: Genesis 1"`.
    pub fn title(category: &str, index: usize, reading: &Reading) -> String {
        match reading.reference() {
            Some(reference) => format!("{} {}: {}", category, index + 1, reference),
            None => format!("{} {}", category, index + 1),
        }
    }

    /// Render the full day: both tracks with titled sections, or an
    /// explicit empty state when nothing was recoverable.
    pub fn format_display(&self, options: &DisplayOptions) -> String {
        if self.is_empty() {
            return "No readings found for this date.".to_string();
        }

        let mut sections: Vec<String> = Vec::new();
        for (category, readings) in [("Family", &self.family), ("Secret", &self.secret)] {
            for (i, reading) in readings.iter().enumerate() {
                let title = Self::title(category, i, reading);
                let body = match reading {
                    Reading::Structured(passage) => passage.format_display(options),
                    Reading::Legacy(text) => text.clone(),
                };
                sections.push(format!("{}\n{}\n{}", title, "═".repeat(title.chars().count()), body));
            }
        }
        sections.join("\n\n")
    }

    /// One line per reading, for overviews.
    pub fn format_compact(&self) -> String {
        if self.is_empty() {
            return "No readings found for this date.".to_string();
        }
        let mut lines: Vec<String> = Vec::new();
        for (category, readings) in [("Family", &self.family), ("Secret", &self.secret)] {
            for (i, reading) in readings.iter().enumerate() {
                let line = match reading {
                    Reading::Structured(passage) => {
                        format!("{} {}: {}", category, i + 1, passage.format_compact())
                    }
                    Reading::Legacy(_) => format!("{} {}: (legacy entry)", category, i + 1),
                };
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

/// Today's date shifted by `offset` days.
pub fn date_with_offset(offset: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(offset)
}

/// Load readings for the target date, falling back to the adjacent days.
///
/// Order is target, the day before, the day after; the first cache hit
/// wins and its actual date is returned alongside. Nothing is ever
/// synthesized; three misses yield `None`.
pub async fn load_with_fallback(
    cache: &ReadingCache,
    offset: i64,
) -> (NaiveDate, Option<DailyReadings>) {
    let target = date_with_offset(offset);
    for delta in [0i64, -1, 1] {
        let date = target + Duration::days(delta);
        if let Some(readings) = cache.load_structured(date).await {
            if delta != 0 {
                tracing::info!(date = %date, "using readings from adjacent day");
            }
            return (date, Some(readings));
        }
    }
    (target, None)
}
