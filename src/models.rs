//! Core data model: positions, verses, highlights, and passages.
//!
//! These types flow through the parser, the highlight engine, and the cache
//! layer. Construction validates; after that, instances are immutable in
//! normal flow (highlights are the only mutation path on a passage, via the
//! methods in [`crate::highlights`]).
//!
//! A [`BibleHighlight`] is not self-contained — its positions are indices
//! into the owning passage's verse list and must be re-validated against
//! that passage at the point of use. A highlight loaded from a corrupt
//! cache may be transiently invalid; read paths skip it rather than panic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LectioError, Result};
use crate::memo::Memo;

/// A (verse, word) coordinate within a passage.
///
/// Totally ordered: primary key `verse_index`, tie-break `word_index` (the
/// derived `Ord` uses field order). Pure value type; it never owns data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HighlightPosition {
    pub verse_index: usize,
    pub word_index: usize,
}

impl HighlightPosition {
    pub fn new(verse_index: usize, word_index: usize) -> Self {
        Self {
            verse_index,
            word_index,
        }
    }
}

impl std::fmt::Display for HighlightPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "verse {}, word {}", self.verse_index, self.word_index)
    }
}

/// A single validated verse: the atomic unit of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BibleVerse {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub text: String,
    #[serde(skip)]
    words_memo: Memo<Vec<String>>,
    #[serde(skip)]
    word_count_memo: Memo<usize>,
}

impl PartialEq for BibleVerse {
    fn eq(&self, other: &Self) -> bool {
        self.book == other.book
            && self.chapter == other.chapter
            && self.verse == other.verse
            && self.text == other.text
    }
}

impl BibleVerse {
    /// Construct a verse, trimming `book` and `text`.
    ///
    /// Fails with [`LectioError::Validation`] if book or text is empty or
    /// whitespace-only, or chapter/verse is zero.
    pub fn new(book: &str, chapter: u32, verse: u32, text: &str) -> Result<Self> {
        let book = book.trim();
        let text = text.trim();
        if book.is_empty() {
            return Err(LectioError::Validation(
                "book name cannot be empty or just whitespace".to_string(),
            ));
        }
        if text.is_empty() {
            return Err(LectioError::Validation(
                "verse text cannot be empty or just whitespace".to_string(),
            ));
        }
        if chapter == 0 {
            return Err(LectioError::Validation(
                "chapter number must be positive".to_string(),
            ));
        }
        if verse == 0 {
            return Err(LectioError::Validation(
                "verse number must be positive".to_string(),
            ));
        }
        Ok(Self {
            book: book.to_string(),
            chapter,
            verse,
            text: text.to_string(),
            words_memo: Memo::new(),
            word_count_memo: Memo::new(),
        })
    }

    /// Re-check the construction invariants on a deserialized verse.
    ///
    /// Serde bypasses [`BibleVerse::new`], so the cache loader calls this
    /// before accepting a verse from disk.
    pub fn validate(&self) -> Result<()> {
        let _ = Self::new(&self.book, self.chapter, self.verse, &self.text)?;
        Ok(())
    }

    /// Verse text split on whitespace, computed once.
    pub fn words(&self) -> Vec<String> {
        self.words_memo
            .get_or_compute(|| self.text.split_whitespace().map(str::to_string).collect())
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.word_count_memo.get_or_compute(|| self.words().len())
    }

    /// Character count of the verse text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Standard reference string, e.g. `"John 3:16"`.
    pub fn reference(&self) -> String {
        format!("{} {}:{}", self.book, self.chapter, self.verse)
    }

    /// Drop memoized derived values. Only needed if `text` is mutated,
    /// which normal flow never does.
    pub fn invalidate_cache(&self) {
        self.words_memo.invalidate();
        self.word_count_memo.invalidate();
    }
}

impl std::fmt::Display for BibleVerse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.reference(), self.text)
    }
}

/// A user-annotation range over a passage's verses.
///
/// `highlight_count` models anonymous-aggregate popularity: how many users
/// highlighted the identical range. It only ever increases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibleHighlight {
    pub start_position: HighlightPosition,
    pub end_position: HighlightPosition,
    pub highlight_count: u32,
}

impl BibleHighlight {
    /// Construct a highlight, validating that the range is not inverted and
    /// the count is at least one.
    pub fn new(
        start_position: HighlightPosition,
        end_position: HighlightPosition,
        highlight_count: u32,
    ) -> Result<Self> {
        if end_position < start_position {
            return Err(LectioError::Validation(
                "end position must be after or equal to start position".to_string(),
            ));
        }
        if highlight_count == 0 {
            return Err(LectioError::Validation(
                "highlight count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            start_position,
            end_position,
            highlight_count,
        })
    }

    /// Re-check construction invariants on a deserialized highlight.
    pub fn validate(&self) -> Result<()> {
        let _ = Self::new(self.start_position, self.end_position, self.highlight_count)?;
        Ok(())
    }

    /// Whether the range crosses a verse boundary.
    pub fn spans_multiple_verses(&self) -> bool {
        self.start_position.verse_index != self.end_position.verse_index
    }

    /// Extract the highlighted words from the owning passage.
    ///
    /// Word ranges are inclusive at both ends. For a multi-verse highlight
    /// the first verse contributes its tail, interior verses contribute all
    /// words, and the last verse contributes its head; each verse's word
    /// bound is checked independently before slicing.
    pub fn get_highlighted_text(&self, passage: &BiblePassage) -> Result<String> {
        let max_verse = self
            .start_position
            .verse_index
            .max(self.end_position.verse_index);
        if max_verse >= passage.verses.len() {
            return Err(LectioError::Range {
                what: "highlight verse",
                index: max_verse,
                bound: passage.verses.len(),
            });
        }

        if !self.spans_multiple_verses() {
            let words = passage.verses[self.start_position.verse_index].words();
            if self.start_position.word_index >= words.len() {
                return Err(LectioError::Range {
                    what: "start word",
                    index: self.start_position.word_index,
                    bound: words.len(),
                });
            }
            if self.end_position.word_index >= words.len() {
                return Err(LectioError::Range {
                    what: "end word",
                    index: self.end_position.word_index,
                    bound: words.len(),
                });
            }
            return Ok(
                words[self.start_position.word_index..=self.end_position.word_index].join(" "),
            );
        }

        let mut parts: Vec<String> = Vec::new();
        for verse_idx in self.start_position.verse_index..=self.end_position.verse_index {
            let words = passage.verses[verse_idx].words();
            let slice: &[String] = if verse_idx == self.start_position.verse_index {
                if self.start_position.word_index >= words.len() {
                    return Err(LectioError::Range {
                        what: "start word",
                        index: self.start_position.word_index,
                        bound: words.len(),
                    });
                }
                &words[self.start_position.word_index..]
            } else if verse_idx == self.end_position.verse_index {
                if self.end_position.word_index >= words.len() {
                    return Err(LectioError::Range {
                        what: "end word",
                        index: self.end_position.word_index,
                        bound: words.len(),
                    });
                }
                &words[..=self.end_position.word_index]
            } else {
                &words[..]
            };
            if !slice.is_empty() {
                parts.push(slice.join(" "));
            }
        }
        Ok(parts.join(" "))
    }
}

/// The aggregate root: a passage owning its verses and highlights.
///
/// Created by the parser (fresh fetch) or by deserializing cache JSON;
/// mutated only through the highlight-management methods; single-writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiblePassage {
    pub reference: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub verses: Vec<BibleVerse>,
    #[serde(default)]
    pub highlights: Vec<BibleHighlight>,
    #[serde(default = "Utc::now")]
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    total_words_memo: Memo<usize>,
    #[serde(skip)]
    total_characters_memo: Memo<usize>,
    #[serde(skip)]
    books_memo: Memo<Vec<String>>,
    #[serde(skip)]
    chapter_range_memo: Memo<String>,
}

fn default_version() -> String {
    "NKJV".to_string()
}

impl BiblePassage {
    /// Construct a passage with validation: reference and version must be
    /// non-empty after trimming, and there must be at least one verse.
    pub fn new(reference: &str, version: &str, verses: Vec<BibleVerse>) -> Result<Self> {
        let reference = reference.trim();
        let version = version.trim();
        if reference.is_empty() {
            return Err(LectioError::Validation(
                "reference cannot be empty or just whitespace".to_string(),
            ));
        }
        if version.is_empty() {
            return Err(LectioError::Validation(
                "version cannot be empty or just whitespace".to_string(),
            ));
        }
        if verses.is_empty() {
            return Err(LectioError::Validation(
                "passage must contain at least one verse".to_string(),
            ));
        }
        Ok(Self {
            reference: reference.to_string(),
            version: version.to_string(),
            verses,
            highlights: Vec::new(),
            fetched_at: Utc::now(),
            total_words_memo: Memo::new(),
            total_characters_memo: Memo::new(),
            books_memo: Memo::new(),
            chapter_range_memo: Memo::new(),
        })
    }

    /// Re-check invariants on a deserialized passage, including every verse
    /// and highlight. Used by the cache loader to reject corrupt entries.
    pub fn validate(&self) -> Result<()> {
        if self.reference.trim().is_empty() {
            return Err(LectioError::Validation(
                "reference cannot be empty or just whitespace".to_string(),
            ));
        }
        if self.version.trim().is_empty() {
            return Err(LectioError::Validation(
                "version cannot be empty or just whitespace".to_string(),
            ));
        }
        if self.verses.is_empty() {
            return Err(LectioError::Validation(
                "passage must contain at least one verse".to_string(),
            ));
        }
        for verse in &self.verses {
            verse.validate()?;
        }
        for highlight in &self.highlights {
            highlight.validate()?;
        }
        Ok(())
    }

    pub fn total_verses(&self) -> usize {
        self.verses.len()
    }

    /// Total word count across all verses, computed once.
    pub fn total_words(&self) -> usize {
        self.total_words_memo
            .get_or_compute(|| self.verses.iter().map(|v| v.word_count()).sum())
    }

    /// Total character count across all verses, computed once.
    pub fn total_characters(&self) -> usize {
        self.total_characters_memo
            .get_or_compute(|| self.verses.iter().map(|v| v.char_count()).sum())
    }

    /// Unique book names in order of first appearance.
    pub fn books(&self) -> Vec<String> {
        self.books_memo.get_or_compute(|| {
            let mut seen = std::collections::HashSet::new();
            let mut result = Vec::new();
            for verse in &self.verses {
                if seen.insert(verse.book.clone()) {
                    result.push(verse.book.clone());
                }
            }
            result
        })
    }

    /// Human-readable chapter range spanning the first and last verse,
    /// e.g. `"1:1-38"` or `"12:1-13:1"`.
    pub fn chapter_range(&self) -> String {
        self.chapter_range_memo.get_or_compute(|| {
            let first = match self.verses.first() {
                Some(v) => v,
                None => return String::new(),
            };
            if self.verses.len() == 1 {
                return format!("{}:{}", first.chapter, first.verse);
            }
            let last = self.verses.last().expect("non-empty verses");
            if first.chapter == last.chapter {
                format!("{}:{}-{}", first.chapter, first.verse, last.verse)
            } else {
                format!(
                    "{}:{}-{}:{}",
                    first.chapter, first.verse, last.chapter, last.verse
                )
            }
        })
    }

    /// Drop memoized aggregate statistics. Callers that mutate `verses`
    /// directly (not supported in normal flow) must call this.
    pub fn invalidate_cache(&self) {
        self.total_words_memo.invalidate();
        self.total_characters_memo.invalidate();
        self.books_memo.invalidate();
        self.chapter_range_memo.invalidate();
    }
}

impl std::fmt::Display for BiblePassage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({} verses, {} highlights)",
            self.reference,
            self.total_verses(),
            self.highlights.len()
        )
    }
}
