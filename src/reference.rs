//! Bible reference grammar and book-name normalization.
//!
//! `parse_reference` tries the grammar alternatives most-specific first,
//! since every cross-chapter range is also a prefix match for the simpler
//! patterns:
//!
//! | Form                  | Example               | Result                      |
//! |-----------------------|-----------------------|-----------------------------|
//! | cross-chapter range   | `Zechariah 12:1-13:1` | (book, 12, 1, None)         |
//! | in-chapter range      | `Luke 1:1-38`         | (book, 1, 1, Some(38))      |
//! | single verse          | `John 3:16`           | (book, 3, 16, None)         |
//! | whole chapter         | `Genesis 1`           | (book, 1, 1, None)          |

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{LectioError, Result};

/// The components of a parsed reference. `end_verse` is `None` for single
/// verses, whole chapters, and cross-chapter ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub book: String,
    pub chapter: u32,
    pub start_verse: u32,
    pub end_verse: Option<u32>,
}

static CROSS_CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d?\s*[A-Za-z]+)\s+(\d+):(\d+)-(\d+):(\d+)").expect("regex"));
static VERSE_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d?\s*[A-Za-z]+)\s+(\d+):(\d+)-(\d+)").expect("regex"));
static SINGLE_VERSE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d?\s*[A-Za-z]+)\s+(\d+):(\d+)").expect("regex"));
static WHOLE_CHAPTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d?\s*[A-Za-z]+)\s+(\d+)").expect("regex"));
static NUMBERED_BOOK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\s*([a-z]+)$").expect("regex"));

fn capture_u32(caps: &regex::Captures<'_>, idx: usize) -> Result<u32> {
    caps.get(idx)
        .expect("capture group")
        .as_str()
        .parse::<u32>()
        .map_err(|_| LectioError::Parse("number out of range in reference".to_string()))
}

/// Parse a reference string into its components.
///
/// Cross-chapter ranges collapse to `(book, start_chapter, start_verse,
/// None)`; downstream code treats the text as one block. Whole-chapter
/// references start at verse 1.
pub fn parse_reference(reference: &str) -> Result<ParsedReference> {
    let reference = reference.trim();

    if let Some(caps) = CROSS_CHAPTER_RE.captures(reference) {
        return Ok(ParsedReference {
            book: caps[1].trim().to_string(),
            chapter: capture_u32(&caps, 2)?,
            start_verse: capture_u32(&caps, 3)?,
            end_verse: None,
        });
    }
    if let Some(caps) = VERSE_RANGE_RE.captures(reference) {
        return Ok(ParsedReference {
            book: caps[1].trim().to_string(),
            chapter: capture_u32(&caps, 2)?,
            start_verse: capture_u32(&caps, 3)?,
            end_verse: Some(capture_u32(&caps, 4)?),
        });
    }
    if let Some(caps) = SINGLE_VERSE_RE.captures(reference) {
        return Ok(ParsedReference {
            book: caps[1].trim().to_string(),
            chapter: capture_u32(&caps, 2)?,
            start_verse: capture_u32(&caps, 3)?,
            end_verse: None,
        });
    }
    if let Some(caps) = WHOLE_CHAPTER_RE.captures(reference) {
        return Ok(ParsedReference {
            book: caps[1].trim().to_string(),
            chapter: capture_u32(&caps, 2)?,
            start_verse: 1,
            end_verse: None,
        });
    }

    Err(LectioError::Parse(format!(
        "could not parse Bible reference: {reference}"
    )))
}

/// Whether the reference text describes a range crossing a chapter
/// boundary, e.g. `"Zechariah 12:1-13:1"`.
pub fn is_cross_chapter_reference(reference: &str) -> bool {
    CROSS_CHAPTER_RE.is_match(reference.trim())
}

static BOOK_MAPPINGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("gen", "Genesis"),
        ("genesis", "Genesis"),
        ("ex", "Exodus"),
        ("exod", "Exodus"),
        ("exodus", "Exodus"),
        ("lev", "Leviticus"),
        ("leviticus", "Leviticus"),
        ("num", "Numbers"),
        ("numbers", "Numbers"),
        ("deut", "Deuteronomy"),
        ("deuteronomy", "Deuteronomy"),
        ("josh", "Joshua"),
        ("joshua", "Joshua"),
        ("judg", "Judges"),
        ("judges", "Judges"),
        ("ruth", "Ruth"),
        ("1sam", "1 Samuel"),
        ("1 sam", "1 Samuel"),
        ("1samuel", "1 Samuel"),
        ("2sam", "2 Samuel"),
        ("2 sam", "2 Samuel"),
        ("2samuel", "2 Samuel"),
        ("1kings", "1 Kings"),
        ("1 kings", "1 Kings"),
        ("1kgs", "1 Kings"),
        ("2kings", "2 Kings"),
        ("2 kings", "2 Kings"),
        ("2kgs", "2 Kings"),
        ("1chr", "1 Chronicles"),
        ("1 chr", "1 Chronicles"),
        ("1chronicles", "1 Chronicles"),
        ("2chr", "2 Chronicles"),
        ("2 chr", "2 Chronicles"),
        ("2chronicles", "2 Chronicles"),
        ("ezra", "Ezra"),
        ("neh", "Nehemiah"),
        ("nehemiah", "Nehemiah"),
        ("esth", "Esther"),
        ("esther", "Esther"),
        ("job", "Job"),
        ("ps", "Psalms"),
        ("psalm", "Psalms"),
        ("psalms", "Psalms"),
        ("psa", "Psalms"),
        ("prov", "Proverbs"),
        ("proverbs", "Proverbs"),
        ("eccl", "Ecclesiastes"),
        ("ecclesiastes", "Ecclesiastes"),
        ("ecc", "Ecclesiastes"),
        ("song", "Song of Solomon"),
        ("songs", "Song of Solomon"),
        ("sos", "Song of Solomon"),
        ("isa", "Isaiah"),
        ("isaiah", "Isaiah"),
        ("jer", "Jeremiah"),
        ("jeremiah", "Jeremiah"),
        ("lam", "Lamentations"),
        ("lamentations", "Lamentations"),
        ("ezek", "Ezekiel"),
        ("ezekiel", "Ezekiel"),
        ("dan", "Daniel"),
        ("daniel", "Daniel"),
        ("hos", "Hosea"),
        ("hosea", "Hosea"),
        ("joel", "Joel"),
        ("amos", "Amos"),
        ("obad", "Obadiah"),
        ("obadiah", "Obadiah"),
        ("jonah", "Jonah"),
        ("mic", "Micah"),
        ("micah", "Micah"),
        ("nah", "Nahum"),
        ("nahum", "Nahum"),
        ("hab", "Habakkuk"),
        ("habakkuk", "Habakkuk"),
        ("zeph", "Zephaniah"),
        ("zephaniah", "Zephaniah"),
        ("hag", "Haggai"),
        ("haggai", "Haggai"),
        ("zech", "Zechariah"),
        ("zechariah", "Zechariah"),
        ("mal", "Malachi"),
        ("malachi", "Malachi"),
        ("matt", "Matthew"),
        ("matthew", "Matthew"),
        ("mt", "Matthew"),
        ("mark", "Mark"),
        ("mk", "Mark"),
        ("luke", "Luke"),
        ("lk", "Luke"),
        ("john", "John"),
        ("jn", "John"),
        ("acts", "Acts"),
        ("rom", "Romans"),
        ("romans", "Romans"),
        ("1cor", "1 Corinthians"),
        ("1 cor", "1 Corinthians"),
        ("1corinthians", "1 Corinthians"),
        ("2cor", "2 Corinthians"),
        ("2 cor", "2 Corinthians"),
        ("2corinthians", "2 Corinthians"),
        ("gal", "Galatians"),
        ("galatians", "Galatians"),
        ("eph", "Ephesians"),
        ("ephesians", "Ephesians"),
        ("phil", "Philippians"),
        ("philippians", "Philippians"),
        ("col", "Colossians"),
        ("colossians", "Colossians"),
        ("1thess", "1 Thessalonians"),
        ("1 thess", "1 Thessalonians"),
        ("1thessalonians", "1 Thessalonians"),
        ("2thess", "2 Thessalonians"),
        ("2 thess", "2 Thessalonians"),
        ("2thessalonians", "2 Thessalonians"),
        ("1tim", "1 Timothy"),
        ("1 tim", "1 Timothy"),
        ("1timothy", "1 Timothy"),
        ("2tim", "2 Timothy"),
        ("2 tim", "2 Timothy"),
        ("2timothy", "2 Timothy"),
        ("titus", "Titus"),
        ("philem", "Philemon"),
        ("philemon", "Philemon"),
        ("heb", "Hebrews"),
        ("hebrews", "Hebrews"),
        ("jas", "James"),
        ("james", "James"),
        ("1pet", "1 Peter"),
        ("1 pet", "1 Peter"),
        ("1peter", "1 Peter"),
        ("2pet", "2 Peter"),
        ("2 pet", "2 Peter"),
        ("2peter", "2 Peter"),
        ("1john", "1 John"),
        ("1 john", "1 John"),
        ("1jn", "1 John"),
        ("2john", "2 John"),
        ("2 john", "2 John"),
        ("2jn", "2 John"),
        ("3john", "3 John"),
        ("3 john", "3 John"),
        ("3jn", "3 John"),
        ("jude", "Jude"),
        ("rev", "Revelation"),
        ("revelation", "Revelation"),
    ])
});

/// Normalize a book name or abbreviation to its canonical form.
///
/// Unknown names fall back to title case rather than failing; the parser
/// should not reject a passage over an unrecognized book spelling.
pub fn normalize_book_name(book: &str) -> String {
    let book = book.trim();
    let lower = book.to_lowercase();

    if let Some(canonical) = BOOK_MAPPINGS.get(lower.as_str()) {
        return (*canonical).to_string();
    }

    // "1 kings" style with the space already handled above; this catches
    // variants like "1   kings" by re-keying without the gap.
    if let Some(caps) = NUMBERED_BOOK_RE.captures(&lower) {
        let key = format!("{}{}", &caps[1], &caps[2]);
        if let Some(canonical) = BOOK_MAPPINGS.get(key.as_str()) {
            return (*canonical).to_string();
        }
    }

    title_case(book)
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

static OLD_TESTAMENT_BOOKS: &[&str] = &[
    "genesis",
    "exodus",
    "leviticus",
    "numbers",
    "deuteronomy",
    "joshua",
    "judges",
    "ruth",
    "1 samuel",
    "2 samuel",
    "1 kings",
    "2 kings",
    "1 chronicles",
    "2 chronicles",
    "ezra",
    "nehemiah",
    "esther",
    "job",
    "psalms",
    "psalm",
    "proverbs",
    "ecclesiastes",
    "song of solomon",
    "song of songs",
    "isaiah",
    "jeremiah",
    "lamentations",
    "ezekiel",
    "daniel",
    "hosea",
    "joel",
    "amos",
    "obadiah",
    "jonah",
    "micah",
    "nahum",
    "habakkuk",
    "zephaniah",
    "haggai",
    "zechariah",
    "malachi",
];

/// Whether the book belongs to the Old Testament. Used to gate the divine
/// name typography, which does not apply to New Testament text.
pub fn is_old_testament_book(book: &str) -> bool {
    let lower = book.trim().to_lowercase();
    OLD_TESTAMENT_BOOKS.contains(&lower.as_str())
}
