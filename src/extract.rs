//! Verse extraction from raw passage text.
//!
//! Scraped text arrives in wildly different shapes, so extraction walks a
//! cascade of strategies from most to least structured:
//!
//! 1. inline verse-number markers (`1 text 2 text`, `1. text`, `1: text`),
//!    accepted only when at least two markers match
//! 2. one verse per line, lines starting with a number
//! 3. standalone-number splits with a plausibility rule on the numbers
//! 4. sentence distribution across a known verse range
//! 5. the whole block as a single verse
//!
//! Fragments under 10 characters after cleaning are treated as markup
//! noise and dropped.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LectioError, Result};
use crate::models::{BiblePassage, BibleVerse};
use crate::reference::{is_cross_chapter_reference, normalize_book_name, parse_reference};
use crate::typography::apply_typography;

const MIN_FRAGMENT_LEN: usize = 10;

static MULTI_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\s+.*?\d+\s+").expect("regex"));
static LEADING_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s*").expect("regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("regex"));
static FOOTNOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[abc]\]").expect("regex"));
static BRACKETED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("regex"));
static LINE_VERSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\s+(.+)").expect("regex"));
static STANDALONE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\d+)\s+").expect("regex"));
static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+\s+").expect("regex"));

/// Clean a block of verse text: strip a leading verse number (only when
/// the block holds a single verse), collapse whitespace, drop footnote
/// markers and editorial bracket notes, then run the typography pass.
pub fn clean_verse_text(text: &str, book: Option<&str>) -> String {
    let mut text = text.trim().to_string();
    if text.is_empty() {
        return text;
    }

    if !MULTI_NUMBER_RE.is_match(&text) {
        text = LEADING_NUMBER_RE.replace(&text, "").into_owned();
    }
    text = WHITESPACE_RE.replace_all(&text, " ").into_owned();
    text = FOOTNOTE_RE.replace_all(&text, "").into_owned();

    // Bracketed content goes only when it reads like an editorial note.
    text = BRACKETED_RE
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            let inner = caps[0].to_lowercase();
            if ["note", "see", "cf", "compare", "lit", "or"]
                .iter()
                .any(|word| inner.contains(word))
            {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    text = WHITESPACE_RE.replace_all(&text, " ").trim().to_string();
    apply_typography(&text, book)
}

/// One inline verse marker style: the delimiter between number and text.
enum MarkerStyle {
    Space,
    Dot,
    Colon,
}

impl MarkerStyle {
    fn regex(&self) -> &'static Regex {
        static SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s+").expect("regex"));
        static DOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\.\s*").expect("regex"));
        static COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+):\s*").expect("regex"));
        match self {
            MarkerStyle::Space => &SPACE,
            MarkerStyle::Dot => &DOT,
            MarkerStyle::Colon => &COLON,
        }
    }
}

/// Extract individual verses from a text block using the strategy cascade.
pub fn extract_verses_from_text(
    text: &str,
    book: &str,
    chapter: u32,
    start_verse: u32,
    end_verse: Option<u32>,
) -> Vec<BibleVerse> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    let canonical_book = normalize_book_name(book);

    for style in [MarkerStyle::Space, MarkerStyle::Dot, MarkerStyle::Colon] {
        let verses = extract_by_markers(text, style.regex(), &canonical_book, book, chapter);
        if !verses.is_empty() {
            return verses;
        }
    }

    if let Some(verses) = extract_by_lines(text, &canonical_book, book, chapter) {
        return verses;
    }

    if let Some(verses) = extract_by_number_split(text, &canonical_book, book, chapter, start_verse)
    {
        return verses;
    }

    extract_fallback(text, &canonical_book, book, chapter, start_verse, end_verse)
}

/// Strategy 1: slice the text at inline verse-number markers. Accepted
/// only when at least two markers matched, otherwise a number inside the
/// text would masquerade as structure.
fn extract_by_markers(
    text: &str,
    marker: &Regex,
    canonical_book: &str,
    raw_book: &str,
    chapter: u32,
) -> Vec<BibleVerse> {
    let markers: Vec<(u32, usize, usize)> = marker
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num = caps.get(1)?.as_str().parse::<u32>().ok()?;
            Some((num, whole.start(), whole.end()))
        })
        .collect();
    if markers.len() < 2 {
        return Vec::new();
    }
    tracing::debug!(count = markers.len(), "found inline verse markers");

    let mut verses = Vec::new();
    for (i, &(verse_num, _, seg_start)) in markers.iter().enumerate() {
        let seg_end = markers
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(text.len());
        let cleaned = clean_verse_text(&text[seg_start..seg_end], Some(raw_book));
        if cleaned.chars().count() > MIN_FRAGMENT_LEN && verse_num > 0 {
            if let Ok(verse) = BibleVerse::new(canonical_book, chapter, verse_num, &cleaned) {
                verses.push(verse);
            }
        }
    }
    verses.sort_by_key(|v| v.verse);
    verses
}

/// Strategy 2: one verse per line, each line opening with its number.
fn extract_by_lines(
    text: &str,
    canonical_book: &str,
    raw_book: &str,
    chapter: u32,
) -> Option<Vec<BibleVerse>> {
    let mut verses = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = LINE_VERSE_RE.captures(line) {
            let verse_num: u32 = match caps[1].parse() {
                Ok(n) if n > 0 => n,
                _ => continue,
            };
            let cleaned = clean_verse_text(&caps[2], Some(raw_book));
            if cleaned.chars().count() > MIN_FRAGMENT_LEN {
                if let Ok(verse) = BibleVerse::new(canonical_book, chapter, verse_num, &cleaned) {
                    verses.push(verse);
                }
            }
        }
    }
    if verses.is_empty() {
        return None;
    }
    verses.sort_by_key(|v| v.verse);
    Some(verses)
}

/// Strategy 3: split on standalone numbers, trusting a number as a verse
/// marker only when it is plausible (at least the running count, at most
/// 200); implausible numbers fall back to sequential numbering.
fn extract_by_number_split(
    text: &str,
    canonical_book: &str,
    raw_book: &str,
    chapter: u32,
    start_verse: u32,
) -> Option<Vec<BibleVerse>> {
    let splits: Vec<(u32, usize, usize)> = STANDALONE_NUMBER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num = caps.get(1)?.as_str().parse::<u32>().ok();
            Some((num.unwrap_or(0), whole.start(), whole.end()))
        })
        .collect();
    if splits.is_empty() {
        return None;
    }

    let mut verses = Vec::new();
    let mut current_verse = start_verse;
    for (i, &(parsed, _, seg_start)) in splits.iter().enumerate() {
        if parsed >= current_verse && parsed <= 200 {
            current_verse = parsed;
        } else {
            current_verse += 1;
        }
        let seg_end = splits
            .get(i + 1)
            .map(|&(_, next_start, _)| next_start)
            .unwrap_or(text.len());
        let cleaned = clean_verse_text(&text[seg_start..seg_end], Some(raw_book));
        if cleaned.chars().count() > MIN_FRAGMENT_LEN {
            if let Ok(verse) = BibleVerse::new(canonical_book, chapter, current_verse, &cleaned) {
                verses.push(verse);
            }
        }
    }
    if verses.is_empty() {
        None
    } else {
        Some(verses)
    }
}

/// Strategies 4 and 5: distribute sentences across a known verse range,
/// or keep the whole block as one verse.
fn extract_fallback(
    text: &str,
    canonical_book: &str,
    raw_book: &str,
    chapter: u32,
    start_verse: u32,
    end_verse: Option<u32>,
) -> Vec<BibleVerse> {
    let cleaned = clean_verse_text(text, Some(raw_book));
    if cleaned.is_empty() {
        return Vec::new();
    }

    if let Some(end) = end_verse {
        if end > start_verse {
            let sentences: Vec<&str> = SENTENCE_SPLIT_RE
                .split(&cleaned)
                .filter(|s| !s.trim().is_empty())
                .collect();
            let needed = (end - start_verse + 1) as usize;
            if sentences.len() >= needed {
                let per_verse = (sentences.len() / needed).max(1);
                let mut verses = Vec::new();
                let mut idx = 0;
                for verse_num in start_verse..=end {
                    if idx >= sentences.len() {
                        break;
                    }
                    let chunk_end = (idx + per_verse).min(sentences.len());
                    let mut verse_text = sentences[idx..chunk_end].join(". ");
                    if !verse_text.ends_with('.') {
                        verse_text.push('.');
                    }
                    if let Ok(verse) =
                        BibleVerse::new(canonical_book, chapter, verse_num, verse_text.trim())
                    {
                        verses.push(verse);
                    }
                    idx = chunk_end;
                }
                if !verses.is_empty() {
                    return verses;
                }
            }
        }
    }

    match BibleVerse::new(canonical_book, chapter, start_verse, &cleaned) {
        Ok(verse) => vec![verse],
        Err(_) => Vec::new(),
    }
}

/// Parse a raw text block plus its reference into a structured passage.
///
/// Cross-chapter references collapse to a single fabricated verse holding
/// the whole cleaned text; splitting across chapter boundaries would need
/// per-chapter verse counts this layer does not have.
pub fn parse_passage_text(raw_text: &str, reference: &str, version: &str) -> Result<BiblePassage> {
    if raw_text.trim().is_empty() {
        return Err(LectioError::Parse("raw text cannot be empty".to_string()));
    }
    if reference.trim().is_empty() {
        return Err(LectioError::Parse("reference cannot be empty".to_string()));
    }

    let parsed = parse_reference(reference)?;

    if is_cross_chapter_reference(reference) {
        let cleaned = clean_verse_text(raw_text, Some(&parsed.book));
        let verse = BibleVerse::new(
            &normalize_book_name(&parsed.book),
            parsed.chapter,
            parsed.start_verse,
            &cleaned,
        )
        .map_err(|e| LectioError::Parse(format!("cross-chapter text for '{reference}': {e}")))?;
        return BiblePassage::new(reference.trim(), version, vec![verse])
            .map_err(|e| LectioError::Parse(e.to_string()));
    }

    let verses = extract_verses_from_text(
        raw_text,
        &parsed.book,
        parsed.chapter,
        parsed.start_verse,
        parsed.end_verse,
    );
    if verses.is_empty() {
        return Err(LectioError::Parse(format!(
            "no verses could be extracted from text for reference '{reference}'"
        )));
    }

    BiblePassage::new(reference.trim(), version, verses)
        .map_err(|e| LectioError::Parse(e.to_string()))
}

/// Parse a batch of (reference, text) pairs. Entries that fail to parse
/// degrade to a single-verse fallback passage instead of dropping the
/// reading; entries where even the fallback fails are skipped.
pub fn parse_passage_list(entries: &[(String, String)], version: &str) -> Vec<BiblePassage> {
    let mut passages = Vec::with_capacity(entries.len());
    for (reference, text) in entries {
        match parse_passage_text(text, reference, version) {
            Ok(passage) => passages.push(passage),
            Err(err) => {
                tracing::warn!(reference = %reference, error = %err, "passage parse failed, using fallback");
                match fallback_passage(reference, text, version) {
                    Ok(passage) => passages.push(passage),
                    Err(err) => {
                        tracing::error!(reference = %reference, error = %err, "could not build fallback passage");
                    }
                }
            }
        }
    }
    passages
}

fn fallback_passage(reference: &str, text: &str, version: &str) -> Result<BiblePassage> {
    let parsed = parse_reference(reference)?;
    let mut cleaned = clean_verse_text(text, Some(&parsed.book));
    if cleaned.is_empty() {
        cleaned = "Text unavailable".to_string();
    }
    let verse = BibleVerse::new(
        &normalize_book_name(&parsed.book),
        parsed.chapter,
        parsed.start_verse,
        &cleaned,
    )?;
    BiblePassage::new(reference.trim(), version, vec![verse])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_leading_number_for_single_verse() {
        let out = clean_verse_text("16 For God so loved the world", Some("John"));
        assert_eq!(out, "For God so loved the world");
    }

    #[test]
    fn test_clean_keeps_numbers_in_multi_verse_block() {
        let out = clean_verse_text("1 In the beginning 2 The earth was", Some("Genesis"));
        assert!(out.starts_with("1 In the beginning"));
    }

    #[test]
    fn test_clean_removes_footnotes_and_notes() {
        let out = clean_verse_text(
            "For God so loved[a] the world [see note 4] greatly",
            Some("John"),
        );
        assert_eq!(out, "For God so loved the world greatly");
    }

    #[test]
    fn test_clean_normalizes_whitespace() {
        let out = clean_verse_text("For  God\n\tso   loved", Some("John"));
        assert_eq!(out, "For God so loved");
    }

    #[test]
    fn test_extract_inline_markers() {
        let text = "1 In the beginning God created the heavens and the earth. \
                    2 The earth was without form and void and darkness was on the face of the deep.";
        let verses = extract_verses_from_text(text, "Genesis", 1, 1, Some(2));
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].verse, 1);
        assert!(verses[0].text.starts_with("In the beginning"));
        assert_eq!(verses[1].verse, 2);
        assert!(verses[1].text.starts_with("The earth was"));
    }

    #[test]
    fn test_extract_sorts_by_verse_number() {
        let text = "3 Then God said let there be light and there was light. \
                    1 In the beginning God created the heavens and the earth. \
                    2 The earth was without form and void across the deep.";
        let verses = extract_verses_from_text(text, "Genesis", 1, 1, None);
        assert_eq!(verses.len(), 3);
        assert_eq!(verses[0].verse, 1);
        assert_eq!(verses[2].verse, 3);
    }

    #[test]
    fn test_extract_line_per_verse() {
        let text = "1 Blessed is the man who walks not in counsel\n2 But his delight is in the law of the LORD";
        let verses = extract_verses_from_text(text, "Psalms", 1, 1, None);
        assert_eq!(verses.len(), 2);
        assert_eq!(verses[0].verse, 1);
        assert_eq!(verses[1].verse, 2);
    }

    #[test]
    fn test_extract_standalone_number_split() {
        // A single inline marker is not enough for strategy 1, so the
        // standalone-number split picks it up.
        let text = "And God saw the light that it was good 2 God divided the light from the darkness";
        let verses = extract_verses_from_text(text, "Genesis", 1, 1, None);
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse, 2);
        assert!(verses[0].text.starts_with("God divided"));
    }

    #[test]
    fn test_implausible_number_goes_sequential() {
        let text = "The kings reigned over all the land together 999 and their dominion was very great indeed";
        let verses = extract_verses_from_text(text, "2 Kings", 3, 5, None);
        assert_eq!(verses.len(), 1);
        // 999 exceeds the plausibility bound, so numbering continues from 5
        assert_eq!(verses[0].verse, 6);
    }

    #[test]
    fn test_sentence_distribution() {
        let text = "Light was made over the waters. Darkness fled away from it. Morning came upon the earth.";
        let verses = extract_verses_from_text(text, "Genesis", 1, 1, Some(3));
        assert_eq!(verses.len(), 3);
        assert_eq!(verses[0].verse, 1);
        assert_eq!(verses[0].text, "Light was made over the waters.");
        assert_eq!(verses[2].verse, 3);
    }

    #[test]
    fn test_single_verse_fallback() {
        let text = "Jesus wept quietly at the tomb";
        let verses = extract_verses_from_text(text, "John", 11, 35, None);
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse, 35);
        assert_eq!(verses[0].text, "Jesus wept quietly at the tomb");
    }

    #[test]
    fn test_short_fragments_discarded() {
        let text = "1 Amen. 2 The earth was without form and void across the deep waters.";
        let verses = extract_verses_from_text(text, "Genesis", 1, 1, None);
        assert_eq!(verses.len(), 1);
        assert_eq!(verses[0].verse, 2);
    }

    #[test]
    fn test_parse_passage_text_full() {
        let text = "1 Inasmuch as many have taken in hand to set in order a narrative. \
                    2 Just as those who from the beginning were eyewitnesses delivered them.";
        let passage = parse_passage_text(text, "Luke 1:1-2", "NKJV").unwrap();
        assert_eq!(passage.reference, "Luke 1:1-2");
        assert_eq!(passage.version, "NKJV");
        assert_eq!(passage.total_verses(), 2);
        assert_eq!(passage.verses[0].book, "Luke");
    }

    #[test]
    fn test_parse_passage_text_cross_chapter_single_verse() {
        let text = "The burden of the word of the LORD against Israel and more text follows here.";
        let passage = parse_passage_text(text, "Zechariah 12:1-13:1", "NKJV").unwrap();
        assert_eq!(passage.total_verses(), 1);
        assert_eq!(passage.verses[0].chapter, 12);
        assert_eq!(passage.verses[0].verse, 1);
    }

    #[test]
    fn test_parse_passage_text_rejects_empty() {
        assert!(parse_passage_text("", "John 3:16", "NKJV").is_err());
        assert!(parse_passage_text("some text here", "", "NKJV").is_err());
        assert!(parse_passage_text("some text again here", "!!!", "NKJV").is_err());
    }

    #[test]
    fn test_parse_passage_list_degrades_per_entry() {
        let entries = vec![
            (
                "Genesis 1:1".to_string(),
                "In the beginning God created the heavens and the earth".to_string(),
            ),
            ("not a reference".to_string(), "some text".to_string()),
        ];
        let passages = parse_passage_list(&entries, "NKJV");
        // the unparseable reference cannot even build a fallback
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].reference, "Genesis 1:1");
    }

    #[test]
    fn test_parse_passage_list_fallback_passage() {
        // Valid reference but text that extracts to nothing usable still
        // yields a single-verse fallback.
        let entries = vec![("John 3:16".to_string(), "word".to_string())];
        let passages = parse_passage_list(&entries, "NKJV");
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].total_verses(), 1);
    }
}
