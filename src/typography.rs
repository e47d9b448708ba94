//! Typographic cleanup for scraped verse text.
//!
//! Pass order matters: apostrophes are rewritten before the quote state
//! machines run, so contractions never get mistaken for single-quote
//! openers. The divine-name pass runs last and only for Old Testament
//! books, where "the LORD" renders the tetragrammaton; in the New
//! Testament "Lord" refers to Christ and is left alone.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::reference::is_old_testament_book;

const LEFT_DOUBLE: char = '\u{201C}';
const RIGHT_DOUBLE: char = '\u{201D}';
const LEFT_SINGLE: char = '\u{2018}';
const RIGHT_SINGLE: char = '\u{2019}';

static APOSTROPHE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        // it's, don't, we're, I've, I'll, I'd, I'm
        (
            Regex::new(r"\b(\w+)'(s|t|re|ve|ll|d|m)\b").expect("regex"),
            "${1}\u{2019}${2}",
        ),
        // general contractions
        (
            Regex::new(r"\b(\w+)'(\w+)\b").expect("regex"),
            "${1}\u{2019}${2}",
        ),
        // won't, can't
        (
            Regex::new(r"(\w+)n't\b").expect("regex"),
            "${1}n\u{2019}t",
        ),
    ]
});

static ELLIPSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}").expect("regex"));

/// Patterns rendering the tetragrammaton, applied in order. Earlier
/// rewrites pull later compound patterns out of reach, which is fine since
/// the first match already produced the small-caps form.
static DIVINE_NAME_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(the|The) Lord\b").expect("regex"),
            "${1} L\u{1D0F}\u{280}\u{1D05}",
        ),
        (
            Regex::new(r"\b(O|o) Lord\b").expect("regex"),
            "${1} L\u{1D0F}\u{280}\u{1D05}",
        ),
        (
            Regex::new(r"\bLord God\b").expect("regex"),
            "L\u{1D0F}\u{280}\u{1D05} God",
        ),
        (
            Regex::new(r"\bLord of hosts\b").expect("regex"),
            "L\u{1D0F}\u{280}\u{1D05} of hosts",
        ),
        (
            Regex::new(r"\bLord['\u{2019}]s\b").expect("regex"),
            "L\u{1D0F}\u{280}\u{1D05}\u{2019}s",
        ),
        (
            Regex::new(r"^Lord\b").expect("regex"),
            "L\u{1D0F}\u{280}\u{1D05}",
        ),
        (
            Regex::new(r"([.!?] )Lord\b").expect("regex"),
            "${1}L\u{1D0F}\u{280}\u{1D05}",
        ),
    ]
});

/// Apply the full typography pass: apostrophes, curly quotes, em dashes,
/// ellipses, and (for Old Testament books) divine-name small caps.
pub fn apply_typography(text: &str, book: Option<&str>) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut text = text.replace("\\\"", "\"").replace("\\'", "'");

    for (pattern, replacement) in APOSTROPHE_PATTERNS.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    text = convert_double_quotes(&text);
    text = convert_single_quotes(&text);

    text = text.replace("--", "\u{2014}");
    text = ELLIPSIS_RE.replace_all(&text, "\u{2026}").into_owned();

    apply_divine_name(&text, book)
}

fn is_opening_context(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, '(' | '[' | '{' | '-' | '\u{2014}')
}

fn is_closing_context(next: char) -> bool {
    next.is_whitespace()
        || matches!(
            next,
            ')' | ']' | '}' | '.' | ',' | ';' | ':' | '!' | '?' | '-' | '\u{2014}'
        )
}

/// Straight double quotes to typographic quotes, tracking nesting with a
/// depth counter so ambiguous positions alternate correctly.
fn convert_double_quotes(text: &str) -> String {
    if !text.contains('"') {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut open_depth = 0usize;

    for (i, &ch) in chars.iter().enumerate() {
        if ch != '"' {
            result.push(ch);
            continue;
        }
        let prev = if i > 0 { chars[i - 1] } else { ' ' };
        let next = if i + 1 < chars.len() { chars[i + 1] } else { ' ' };

        let opening = is_opening_context(prev)
            || i == 0
            || (matches!(prev, '.' | ',' | ';' | ':' | '!' | '?') && next.is_alphanumeric());
        let closing = is_closing_context(next) || i == chars.len() - 1 || prev.is_alphanumeric();

        if opening && !closing {
            result.push(LEFT_DOUBLE);
            open_depth += 1;
        } else if closing && !opening {
            result.push(RIGHT_DOUBLE);
            open_depth = open_depth.saturating_sub(1);
        } else if open_depth == 0 {
            result.push(LEFT_DOUBLE);
            open_depth += 1;
        } else {
            result.push(RIGHT_DOUBLE);
            open_depth -= 1;
        }
    }
    result
}

/// Remaining straight single quotes: word-internal and word-final marks
/// become apostrophes, the rest go through the same open/close logic as
/// double quotes.
fn convert_single_quotes(text: &str) -> String {
    if !text.contains('\'') {
        return text.to_string();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut open_depth = 0usize;

    for (i, &ch) in chars.iter().enumerate() {
        if ch != '\'' {
            result.push(ch);
            continue;
        }
        let prev = if i > 0 { chars[i - 1] } else { ' ' };
        let next = if i + 1 < chars.len() { chars[i + 1] } else { ' ' };

        if prev.is_alphabetic() && (next.is_whitespace() || is_closing_context(next)) {
            result.push(RIGHT_SINGLE);
            continue;
        }
        if prev.is_alphabetic() && next.is_alphabetic() {
            result.push(RIGHT_SINGLE);
            continue;
        }

        let opening =
            is_opening_context(prev) || prev == '"' || prev == LEFT_DOUBLE || i == 0;
        let closing = is_closing_context(next)
            || next == '"'
            || next == RIGHT_DOUBLE
            || i == chars.len() - 1;

        if opening && !closing {
            result.push(LEFT_SINGLE);
            open_depth += 1;
        } else if closing && !opening {
            result.push(RIGHT_SINGLE);
            open_depth = open_depth.saturating_sub(1);
        } else if open_depth == 0 {
            result.push(LEFT_SINGLE);
            open_depth += 1;
        } else {
            result.push(RIGHT_SINGLE);
            open_depth -= 1;
        }
    }
    result
}

fn apply_divine_name(text: &str, book: Option<&str>) -> String {
    if let Some(book) = book {
        if !is_old_testament_book(book) {
            return text.to_string();
        }
    }
    let mut text = text.to_string();
    for (pattern, replacement) in DIVINE_NAME_PATTERNS.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contraction_apostrophes() {
        assert_eq!(apply_typography("don't", None), "don\u{2019}t");
        assert_eq!(apply_typography("it's the Lord's day", Some("John")), "it\u{2019}s the Lord\u{2019}s day");
        assert_eq!(apply_typography("we're", None), "we\u{2019}re");
        assert_eq!(apply_typography("I'll go", None), "I\u{2019}ll go");
    }

    #[test]
    fn test_double_quote_pairing() {
        let out = apply_typography("He said, \"Follow Me.\"", None);
        assert_eq!(out, "He said, \u{201C}Follow Me.\u{201D}");
    }

    #[test]
    fn test_nested_quotes() {
        let out = apply_typography("\"He told me, 'go forth' yesterday.\"", None);
        assert!(out.starts_with('\u{201C}'));
        assert!(out.contains('\u{2018}'));
        assert!(out.contains('\u{2019}'));
        assert!(out.ends_with('\u{201D}'));
    }

    #[test]
    fn test_word_final_apostrophe() {
        let out = apply_typography("the boys' sandals", None);
        assert_eq!(out, "the boys\u{2019} sandals");
    }

    #[test]
    fn test_em_dash_and_ellipsis() {
        assert_eq!(apply_typography("wait--listen", None), "wait\u{2014}listen");
        assert_eq!(apply_typography("and then...", None), "and then\u{2026}");
        assert_eq!(apply_typography("so....", None), "so\u{2026}");
    }

    #[test]
    fn test_divine_name_old_testament_only() {
        let ot = apply_typography("Praise the Lord, O my soul", Some("Psalms"));
        assert_eq!(ot, "Praise the L\u{1D0F}\u{280}\u{1D05}, O my soul");

        let nt = apply_typography("the Lord Jesus", Some("John"));
        assert_eq!(nt, "the Lord Jesus");
    }

    #[test]
    fn test_divine_name_variants() {
        assert_eq!(
            apply_typography("O Lord of hosts", Some("Isaiah")),
            "O L\u{1D0F}\u{280}\u{1D05} of hosts"
        );
        assert_eq!(
            apply_typography("Lord God made the earth", Some("Genesis")),
            "L\u{1D0F}\u{280}\u{1D05} God made the earth"
        );
        assert_eq!(
            apply_typography("Sing. Lord of hosts reigns", Some("Isaiah")),
            "Sing. L\u{1D0F}\u{280}\u{1D05} of hosts reigns"
        );
    }

    #[test]
    fn test_divine_name_preserves_case() {
        assert_eq!(
            apply_typography("The Lord is my shepherd", Some("Psalms")),
            "The L\u{1D0F}\u{280}\u{1D05} is my shepherd"
        );
    }

    #[test]
    fn test_no_book_applies_divine_name() {
        // Without book context the text is treated as Old Testament.
        assert_eq!(
            apply_typography("the Lord reigns", None),
            "the L\u{1D0F}\u{280}\u{1D05} reigns"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(apply_typography("", Some("Genesis")), "");
    }
}
