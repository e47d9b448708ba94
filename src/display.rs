//! Terminal rendering for verses, highlights, and passages.
//!
//! Everything here is best-effort string building. A highlight that no
//! longer fits its passage renders as an "Invalid highlight" line rather
//! than aborting the whole display.

use crate::models::{BibleHighlight, BiblePassage, BibleVerse};

/// Knobs for [`BiblePassage::format_display`].
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    pub show_metadata: bool,
    pub show_highlights: bool,
    /// 0 shows every verse.
    pub max_verses: usize,
    pub max_width: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_metadata: true,
            show_highlights: true,
            max_verses: 10,
            max_width: 80,
        }
    }
}

impl BibleVerse {
    /// Greedy word-wrap at `max_width`, continuation lines indented under
    /// the reference label when one is shown.
    pub fn format_display(&self, show_reference: bool, max_width: usize) -> String {
        let reference_text = if show_reference {
            format!("{}: ", self.reference())
        } else {
            String::new()
        };
        let available = max_width.saturating_sub(reference_text.chars().count()).max(1);

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in self.words() {
            let extra = word.chars().count() + usize::from(!current.is_empty());
            if current.chars().count() + extra <= available || current.is_empty() {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&word);
            } else {
                lines.push(std::mem::take(&mut current));
                current = word;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }

        if show_reference && !lines.is_empty() {
            let indent = " ".repeat(reference_text.chars().count());
            lines[0] = format!("{}{}", reference_text, lines[0]);
            for line in lines.iter_mut().skip(1) {
                *line = format!("{}{}", indent, line);
            }
        }
        lines.join("\n")
    }

    /// One-line form for lists: reference plus the first 50 characters.
    pub fn format_compact(&self) -> String {
        let truncated: String = self.text.chars().take(50).collect();
        let suffix = if self.text.chars().count() > 50 { "..." } else { "" };
        format!("{}: {}{}", self.reference(), truncated, suffix)
    }
}

impl BibleHighlight {
    /// Render the highlight with optional surrounding context words.
    /// Degrades to an "Invalid highlight" line if extraction fails.
    pub fn format_display(
        &self,
        passage: &BiblePassage,
        show_context: bool,
        context_words: usize,
    ) -> String {
        let highlighted = match self.get_highlighted_text(passage) {
            Ok(text) => text,
            Err(err) => {
                return format!(
                    "✨ Invalid highlight: {} (highlighted by {} users)",
                    err, self.highlight_count
                );
            }
        };

        if !show_context || highlighted.is_empty() {
            return format!(
                "✨ \"{}\" (highlighted by {} users)",
                highlighted, self.highlight_count
            );
        }

        if !self.spans_multiple_verses() {
            let verse = &passage.verses[self.start_position.verse_index];
            let words = verse.words();
            let before_from = self.start_position.word_index.saturating_sub(context_words);
            let after_to = (self.end_position.word_index + 1 + context_words).min(words.len());

            let mut parts: Vec<String> = Vec::new();
            if before_from < self.start_position.word_index {
                parts.push(words[before_from..self.start_position.word_index].join(" "));
            }
            parts.push(format!("**{}**", highlighted));
            if self.end_position.word_index + 1 < after_to {
                parts.push(words[self.end_position.word_index + 1..after_to].join(" "));
            }

            format!(
                "✨ {}: ...{}... (highlighted by {} users)",
                verse.reference(),
                parts.join(" "),
                self.highlight_count
            )
        } else {
            let start_verse = &passage.verses[self.start_position.verse_index];
            let end_verse = &passage.verses[self.end_position.verse_index];
            let preview: String = highlighted.chars().take(100).collect();
            let suffix = if highlighted.chars().count() > 100 { "..." } else { "" };
            format!(
                "✨ {}-{}: \"{}{}\" (highlighted by {} users)",
                start_verse.reference(),
                end_verse.reference(),
                preview,
                suffix,
                self.highlight_count
            )
        }
    }

    /// Index-based one-liner that needs no passage.
    pub fn format_compact(&self) -> String {
        if self.spans_multiple_verses() {
            format!(
                "✨ Verses {}-{} ({} users)",
                self.start_position.verse_index,
                self.end_position.verse_index,
                self.highlight_count
            )
        } else {
            format!(
                "✨ Verse {}, words {}-{} ({} users)",
                self.start_position.verse_index,
                self.start_position.word_index,
                self.end_position.word_index,
                self.highlight_count
            )
        }
    }

    /// Human-readable location using real verse references, 1-based word
    /// numbers. "Invalid position" when the passage is too short.
    pub fn get_position_description(&self, passage: &BiblePassage) -> String {
        let max_verse = self
            .start_position
            .verse_index
            .max(self.end_position.verse_index);
        if max_verse >= passage.verses.len() {
            return "Invalid position".to_string();
        }
        if self.spans_multiple_verses() {
            format!(
                "From {} to {}",
                passage.verses[self.start_position.verse_index].reference(),
                passage.verses[self.end_position.verse_index].reference()
            )
        } else {
            let verse = &passage.verses[self.start_position.verse_index];
            if self.start_position.word_index == self.end_position.word_index {
                format!("{}, word {}", verse.reference(), self.start_position.word_index + 1)
            } else {
                format!(
                    "{}, words {}-{}",
                    verse.reference(),
                    self.start_position.word_index + 1,
                    self.end_position.word_index + 1
                )
            }
        }
    }
}

impl BiblePassage {
    /// Full terminal rendering: header, metadata block, wrapped verses with
    /// per-verse highlight annotations, and the top five popular highlights.
    pub fn format_display(&self, options: &DisplayOptions) -> String {
        let mut lines: Vec<String> = Vec::new();

        let header = format!("📖 {} ({})", self.reference, self.version);
        let header_width = header.chars().count();
        lines.push(header);
        lines.push("─".repeat(header_width));

        if options.show_metadata {
            lines.push(format!(
                "📊 {} verses, {} words, {} characters",
                self.total_verses(),
                self.total_words(),
                self.total_characters()
            ));
            let books = self.books();
            if books.len() > 1 {
                lines.push(format!("📚 Books: {}", books.join(", ")));
            }
            lines.push(format!("📖 Chapter range: {}", self.chapter_range()));
            if options.show_highlights && !self.highlights.is_empty() {
                lines.push(format!(
                    "✨ {} highlights ({:.1}% coverage)",
                    self.highlights.len(),
                    self.get_highlight_coverage()
                ));
            }
            lines.push(String::new());
        }

        let shown = if options.max_verses > 0 {
            self.verses.len().min(options.max_verses)
        } else {
            self.verses.len()
        };
        for (verse_index, verse) in self.verses.iter().take(shown).enumerate() {
            let mut verse_text = verse.format_display(true, options.max_width);
            if options.show_highlights && !self.highlights.is_empty() {
                verse_text = self.annotate_verse(verse_text, verse_index);
            }
            lines.push(verse_text);
        }
        if shown < self.verses.len() {
            lines.push(format!("\n... and {} more verses", self.verses.len() - shown));
        }

        if options.show_highlights && !self.highlights.is_empty() {
            lines.push(format!("\n{}", "─".repeat(40)));
            lines.push("HIGHLIGHTS:".to_string());
            let popular = self.get_popular_highlights(1);
            for (i, highlight) in popular.iter().take(5).enumerate() {
                lines.push(format!("{}. {}", i + 1, highlight.format_display(self, true, 3)));
            }
            if self.highlights.len() > 5 {
                lines.push(format!("... and {} more highlights", self.highlights.len() - 5));
            }
        }

        lines.join("\n")
    }

    /// One-line form for lists.
    pub fn format_compact(&self) -> String {
        let highlight_info = if self.highlights.is_empty() {
            String::new()
        } else {
            format!(", {} highlights", self.highlights.len())
        };
        format!(
            "📖 {} ({} verses{})",
            self.reference,
            self.total_verses(),
            highlight_info
        )
    }

    /// Key/value metadata block without verse text.
    pub fn format_metadata_summary(&self) -> String {
        let mut lines = vec![
            format!("Reference: {}", self.reference),
            format!("Version: {}", self.version),
            format!("Verses: {}", self.total_verses()),
            format!("Words: {}", self.total_words()),
            format!("Characters: {}", self.total_characters()),
        ];
        let books = self.books();
        if books.len() > 1 {
            lines.push(format!("Books: {}", books.join(", ")));
        }
        lines.push(format!("Chapter range: {}", self.chapter_range()));
        if !self.highlights.is_empty() {
            lines.push(format!(
                "Highlights: {} ({:.1}% coverage)",
                self.highlights.len(),
                self.get_highlight_coverage()
            ));
        }
        lines.join("\n")
    }

    /// All highlights, most popular first, with position descriptions and
    /// 50-character previews.
    pub fn format_highlights_summary(&self) -> String {
        if self.highlights.is_empty() {
            return "No highlights in this passage.".to_string();
        }

        let mut lines = vec![
            format!("✨ HIGHLIGHTS SUMMARY ({} total):", self.highlights.len()),
            "─".repeat(40),
        ];
        for (i, highlight) in self.get_popular_highlights(1).iter().enumerate() {
            let preview = match highlight.get_highlighted_text(self) {
                Ok(text) => {
                    let head: String = text.chars().take(50).collect();
                    if text.chars().count() > 50 {
                        format!("{}...", head)
                    } else {
                        head
                    }
                }
                Err(_) => "[Invalid highlight]".to_string(),
            };
            lines.push(format!("{}. {}", i + 1, highlight.get_position_description(self)));
            lines.push(format!("   \"{}\"", preview));
            lines.push(format!("   Highlighted by {} users", highlight.highlight_count));
            lines.push(String::new());
        }
        lines.push(format!(
            "Total coverage: {:.1}% of passage",
            self.get_highlight_coverage()
        ));
        lines.join("\n")
    }

    fn annotate_verse(&self, verse_text: String, verse_index: usize) -> String {
        let mut indicators: Vec<String> = Vec::new();
        for highlight in self.get_highlights_by_verse(verse_index) {
            if highlight.spans_multiple_verses() {
                let note = if verse_index == highlight.start_position.verse_index {
                    "Highlight starts here"
                } else if verse_index == highlight.end_position.verse_index {
                    "Highlight ends here"
                } else {
                    "Part of multi-verse highlight"
                };
                indicators.push(format!(
                    "  ✨ {} (by {} users)",
                    note, highlight.highlight_count
                ));
            } else {
                let words = self.verses[verse_index].words();
                let start = highlight.start_position.word_index;
                let end = highlight.end_position.word_index;
                if start < words.len() && end < words.len() {
                    indicators.push(format!(
                        "  ✨ \"{}\" (by {} users)",
                        words[start..=end].join(" "),
                        highlight.highlight_count
                    ));
                }
            }
        }
        if indicators.is_empty() {
            verse_text
        } else {
            format!("{}\n{}", verse_text, indicators.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BibleHighlight, HighlightPosition};

    fn verse(book: &str, chapter: u32, verse_num: u32, text: &str) -> BibleVerse {
        BibleVerse::new(book, chapter, verse_num, text).unwrap()
    }

    fn pos(v: usize, w: usize) -> HighlightPosition {
        HighlightPosition::new(v, w)
    }

    fn sample_passage() -> BiblePassage {
        BiblePassage::new(
            "John 3:16-17",
            "NKJV",
            vec![
                verse("John", 3, 16, "For God so loved the world that He gave His only begotten Son"),
                verse("John", 3, 17, "For God did not send His Son into the world to condemn the world"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_verse_wrap_indents_under_reference() {
        let v = verse("John", 3, 16, "For God so loved the world that He gave His only begotten Son");
        let out = v.format_display(true, 40);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines[0].starts_with("John 3:16: "));
        let indent = " ".repeat("John 3:16: ".len());
        for line in &lines[1..] {
            assert!(line.starts_with(&indent));
        }
        for line in &lines {
            assert!(line.chars().count() <= 40);
        }
    }

    #[test]
    fn test_verse_wrap_without_reference() {
        let v = verse("John", 3, 16, "For God so loved the world");
        let out = v.format_display(false, 80);
        assert_eq!(out, "For God so loved the world");
    }

    #[test]
    fn test_verse_compact_truncates() {
        let v = verse(
            "John",
            3,
            16,
            "For God so loved the world that He gave His only begotten Son that whoever believes",
        );
        let out = v.format_compact();
        assert!(out.starts_with("John 3:16: "));
        assert!(out.ends_with("..."));

        let short = verse("John", 11, 35, "Jesus wept");
        assert_eq!(short.format_compact(), "John 11:35: Jesus wept");
    }

    #[test]
    fn test_highlight_display_with_context() {
        let passage = sample_passage();
        let h = BibleHighlight::new(pos(0, 3), pos(0, 5), 4).unwrap();
        let out = h.format_display(&passage, true, 2);
        assert!(out.contains("**loved the world**"));
        assert!(out.contains("God so"));
        assert!(out.contains("that He"));
        assert!(out.contains("4 users"));
    }

    #[test]
    fn test_highlight_display_degrades_when_invalid() {
        let passage = sample_passage();
        let h = BibleHighlight::new(pos(9, 0), pos(9, 1), 2).unwrap();
        let out = h.format_display(&passage, true, 3);
        assert!(out.contains("Invalid highlight"));
        assert!(out.contains("2 users"));
    }

    #[test]
    fn test_position_description() {
        let passage = sample_passage();
        let single = BibleHighlight::new(pos(0, 1), pos(0, 1), 1).unwrap();
        assert_eq!(single.get_position_description(&passage), "John 3:16, word 2");

        let span = BibleHighlight::new(pos(0, 1), pos(0, 3), 1).unwrap();
        assert_eq!(span.get_position_description(&passage), "John 3:16, words 2-4");

        let multi = BibleHighlight::new(pos(0, 0), pos(1, 0), 1).unwrap();
        assert_eq!(
            multi.get_position_description(&passage),
            "From John 3:16 to John 3:17"
        );

        let bad = BibleHighlight::new(pos(7, 0), pos(7, 0), 1).unwrap();
        assert_eq!(bad.get_position_description(&passage), "Invalid position");
    }

    #[test]
    fn test_passage_display_sections() {
        let mut passage = sample_passage();
        passage.add_highlight(pos(0, 3), pos(0, 5)).unwrap();
        let out = passage.format_display(&DisplayOptions::default());
        assert!(out.contains("📖 John 3:16-17 (NKJV)"));
        assert!(out.contains("2 verses"));
        assert!(out.contains("Chapter range: 3:16-17"));
        assert!(out.contains("HIGHLIGHTS:"));
        assert!(out.contains("loved the world"));
    }

    #[test]
    fn test_passage_display_truncates_verses() {
        let verses: Vec<BibleVerse> = (1..=12)
            .map(|n| verse("Psalm", 117, n, "Praise the LORD all you Gentiles"))
            .collect();
        let passage = BiblePassage::new("Psalm 117", "NKJV", verses).unwrap();
        let out = passage.format_display(&DisplayOptions {
            max_verses: 10,
            ..Default::default()
        });
        assert!(out.contains("... and 2 more verses"));
    }

    #[test]
    fn test_passage_compact_and_metadata() {
        let mut passage = sample_passage();
        assert_eq!(passage.format_compact(), "📖 John 3:16-17 (2 verses)");
        passage.add_highlight(pos(0, 0), pos(0, 1)).unwrap();
        assert_eq!(
            passage.format_compact(),
            "📖 John 3:16-17 (2 verses, 1 highlights)"
        );

        let summary = passage.format_metadata_summary();
        assert!(summary.contains("Reference: John 3:16-17"));
        assert!(summary.contains("Version: NKJV"));
        assert!(summary.contains("Highlights: 1"));
    }

    #[test]
    fn test_highlights_summary() {
        let mut passage = sample_passage();
        assert_eq!(
            passage.format_highlights_summary(),
            "No highlights in this passage."
        );
        passage.add_highlight(pos(0, 3), pos(0, 5)).unwrap();
        let out = passage.format_highlights_summary();
        assert!(out.contains("HIGHLIGHTS SUMMARY (1 total)"));
        assert!(out.contains("John 3:16, words 4-6"));
        assert!(out.contains("loved the world"));
        assert!(out.contains("Total coverage:"));
    }
}
