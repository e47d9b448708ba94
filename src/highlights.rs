//! Highlight engine: mutation, merging, coverage, search, and statistics
//! over a [`BiblePassage`]'s highlight list.
//!
//! Write paths (`add_highlight`) validate strictly against the passage's
//! actual verse and word bounds. Read paths (coverage, statistics) tolerate
//! highlights that no longer fit the passage, which can happen when an entry
//! is loaded from an older cache, by skipping or clamping them instead of
//! failing the whole computation.

use std::collections::HashSet;

use crate::error::{LectioError, Result};
use crate::models::{BibleHighlight, BiblePassage, HighlightPosition};

/// Conjunctive filter set for [`BiblePassage::search_highlights`].
/// Every populated field must match for a highlight to be included.
#[derive(Debug, Clone, Default)]
pub struct HighlightQuery {
    /// Minimum `highlight_count`, inclusive.
    pub min_count: Option<u32>,
    /// Inclusive range of verse indices the highlight must lie entirely
    /// within: start at or after the low bound, end at or before the high.
    pub verse_range: Option<(usize, usize)>,
    /// Restrict to multi-verse (true) or single-verse (false) highlights.
    pub spans_multiple: Option<bool>,
    /// Case-insensitive substring match against the highlighted text.
    /// Highlights whose text cannot be extracted are excluded.
    pub text_query: Option<String>,
}

/// Aggregate numbers over a passage's highlights, recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightStatistics {
    pub total_highlights: usize,
    pub total_highlight_count: u64,
    pub average_count: f64,
    pub most_popular_count: u32,
    pub single_verse_count: usize,
    pub multi_verse_count: usize,
    pub verses_with_highlights: usize,
    pub coverage_percent: f64,
}

impl BiblePassage {
    /// Record a highlight over `[start, end]`, both positions validated
    /// against this passage's verses and their word counts.
    ///
    /// Adding a range that exactly matches an existing highlight increments
    /// that highlight's count instead of appending a duplicate. Returns a
    /// reference to the stored highlight either way.
    pub fn add_highlight(
        &mut self,
        start: HighlightPosition,
        end: HighlightPosition,
    ) -> Result<&BibleHighlight> {
        self.check_position(start, "start")?;
        self.check_position(end, "end")?;
        if end < start {
            return Err(LectioError::Validation(
                "end position must be after or equal to start position".to_string(),
            ));
        }

        if let Some(idx) = self
            .highlights
            .iter()
            .position(|h| h.start_position == start && h.end_position == end)
        {
            self.highlights[idx].highlight_count += 1;
            return Ok(&self.highlights[idx]);
        }

        let highlight = BibleHighlight::new(start, end, 1)?;
        self.highlights.push(highlight);
        Ok(self.highlights.last().expect("just pushed"))
    }

    fn check_position(&self, pos: HighlightPosition, what: &'static str) -> Result<()> {
        if pos.verse_index >= self.verses.len() {
            return Err(LectioError::Range {
                what,
                index: pos.verse_index,
                bound: self.verses.len(),
            });
        }
        let word_count = self.verses[pos.verse_index].word_count();
        if pos.word_index >= word_count {
            return Err(LectioError::Range {
                what,
                index: pos.word_index,
                bound: word_count,
            });
        }
        Ok(())
    }

    /// Collapse overlapping and same-verse-adjacent highlights into single
    /// ranges whose counts are summed.
    ///
    /// Two highlights merge when the next one starts at or before the
    /// current end, or when they sit in the same verse with consecutive
    /// word indices. Adjacency across a verse boundary does not merge;
    /// verse-final word counts vary, and a boundary gap is treated as a
    /// deliberate break.
    pub fn merge_overlapping_highlights(&mut self) {
        if self.highlights.len() < 2 {
            return;
        }
        self.highlights
            .sort_by_key(|h| (h.start_position, h.end_position));

        let mut merged: Vec<BibleHighlight> = Vec::with_capacity(self.highlights.len());
        for next in self.highlights.drain(..) {
            match merged.last_mut() {
                Some(cur) if should_merge(cur, &next) => {
                    cur.end_position = cur.end_position.max(next.end_position);
                    cur.highlight_count += next.highlight_count;
                }
                _ => merged.push(next),
            }
        }
        self.highlights = merged;
    }

    /// Percentage of the passage's words covered by at least one highlight.
    ///
    /// Builds the union of (verse, word) coordinates across all highlights;
    /// word ranges are clamped to each verse's real word count and
    /// highlights pointing past the verse list are skipped.
    pub fn get_highlight_coverage(&self) -> f64 {
        let total = self.total_words();
        if total == 0 {
            return 0.0;
        }
        let mut covered: HashSet<(usize, usize)> = HashSet::new();
        for highlight in &self.highlights {
            for (verse_idx, lo, hi) in self.highlight_word_spans(highlight) {
                for word_idx in lo..=hi {
                    covered.insert((verse_idx, word_idx));
                }
            }
        }
        covered.len() as f64 / total as f64 * 100.0
    }

    /// Same result as [`Self::get_highlight_coverage`] using per-verse
    /// boolean marks instead of a coordinate set.
    pub fn get_highlight_coverage_optimized(&self) -> f64 {
        let total = self.total_words();
        if total == 0 {
            return 0.0;
        }
        let mut marks: Vec<Vec<bool>> = self
            .verses
            .iter()
            .map(|v| vec![false; v.word_count()])
            .collect();
        for highlight in &self.highlights {
            for (verse_idx, lo, hi) in self.highlight_word_spans(highlight) {
                for word_idx in lo..=hi {
                    marks[verse_idx][word_idx] = true;
                }
            }
        }
        let covered: usize = marks
            .iter()
            .map(|verse| verse.iter().filter(|m| **m).count())
            .sum();
        covered as f64 / total as f64 * 100.0
    }

    /// Per-verse inclusive word spans `(verse_idx, lo, hi)` touched by a
    /// highlight, clamped to real bounds. Empty for highlights whose verse
    /// indices fall outside this passage.
    fn highlight_word_spans(&self, highlight: &BibleHighlight) -> Vec<(usize, usize, usize)> {
        let start = highlight.start_position;
        let end = highlight.end_position;
        if start.verse_index >= self.verses.len() || end.verse_index >= self.verses.len() {
            return Vec::new();
        }
        let mut spans = Vec::new();
        for verse_idx in start.verse_index..=end.verse_index {
            let word_count = self.verses[verse_idx].word_count();
            if word_count == 0 {
                continue;
            }
            let lo = if verse_idx == start.verse_index {
                start.word_index
            } else {
                0
            };
            let hi = if verse_idx == end.verse_index {
                end.word_index.min(word_count - 1)
            } else {
                word_count - 1
            };
            if lo <= hi && lo < word_count {
                spans.push((verse_idx, lo, hi));
            }
        }
        spans
    }

    /// Highlights matching every populated filter in `query`.
    pub fn search_highlights(&self, query: &HighlightQuery) -> Vec<&BibleHighlight> {
        let needle = query.text_query.as_ref().map(|q| q.to_lowercase());
        self.highlights
            .iter()
            .filter(|h| {
                if let Some(min) = query.min_count {
                    if h.highlight_count < min {
                        return false;
                    }
                }
                if let Some((lo, hi)) = query.verse_range {
                    if h.start_position.verse_index < lo || h.end_position.verse_index > hi {
                        return false;
                    }
                }
                if let Some(spans) = query.spans_multiple {
                    if h.spans_multiple_verses() != spans {
                        return false;
                    }
                }
                if let Some(needle) = &needle {
                    match h.get_highlighted_text(self) {
                        Ok(text) => {
                            if !text.to_lowercase().contains(needle.as_str()) {
                                return false;
                            }
                        }
                        Err(_) => return false,
                    }
                }
                true
            })
            .collect()
    }

    /// Aggregate statistics over the current highlight list.
    pub fn get_highlight_statistics(&self) -> HighlightStatistics {
        let total_highlights = self.highlights.len();
        let total_highlight_count: u64 = self
            .highlights
            .iter()
            .map(|h| u64::from(h.highlight_count))
            .sum();
        let average_count = if total_highlights == 0 {
            0.0
        } else {
            total_highlight_count as f64 / total_highlights as f64
        };
        let most_popular_count = self
            .highlights
            .iter()
            .map(|h| h.highlight_count)
            .max()
            .unwrap_or(0);
        let multi_verse_count = self
            .highlights
            .iter()
            .filter(|h| h.spans_multiple_verses())
            .count();

        let mut touched: HashSet<usize> = HashSet::new();
        for highlight in &self.highlights {
            for (verse_idx, _, _) in self.highlight_word_spans(highlight) {
                touched.insert(verse_idx);
            }
        }

        HighlightStatistics {
            total_highlights,
            total_highlight_count,
            average_count,
            most_popular_count,
            single_verse_count: total_highlights - multi_verse_count,
            multi_verse_count,
            verses_with_highlights: touched.len(),
            coverage_percent: self.get_highlight_coverage(),
        }
    }

    /// Highlights with `highlight_count >= min_count`, most popular first.
    pub fn get_popular_highlights(&self, min_count: u32) -> Vec<&BibleHighlight> {
        let mut popular: Vec<&BibleHighlight> = self
            .highlights
            .iter()
            .filter(|h| h.highlight_count >= min_count)
            .collect();
        popular.sort_by(|a, b| b.highlight_count.cmp(&a.highlight_count));
        popular
    }

    /// Remove the highlight with exactly this range. Returns whether one
    /// was removed.
    pub fn remove_highlight(&mut self, start: HighlightPosition, end: HighlightPosition) -> bool {
        match self
            .highlights
            .iter()
            .position(|h| h.start_position == start && h.end_position == end)
        {
            Some(idx) => {
                self.highlights.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Remove all highlights, returning how many were dropped.
    pub fn clear_highlights(&mut self) -> usize {
        let dropped = self.highlights.len();
        self.highlights.clear();
        dropped
    }

    /// Highlights whose range includes the given verse index.
    pub fn get_highlights_by_verse(&self, verse_index: usize) -> Vec<&BibleHighlight> {
        self.highlights
            .iter()
            .filter(|h| {
                h.start_position.verse_index <= verse_index
                    && verse_index <= h.end_position.verse_index
            })
            .collect()
    }
}

fn should_merge(cur: &BibleHighlight, next: &BibleHighlight) -> bool {
    if next.start_position <= cur.end_position {
        return true;
    }
    cur.end_position.verse_index == next.start_position.verse_index
        && cur.end_position.word_index + 1 == next.start_position.word_index
}
