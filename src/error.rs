//! Domain error taxonomy.
//!
//! Four kinds cover everything the model, parser, and cache can get wrong:
//! construction-time validation, out-of-bounds highlight positions, reference
//! grammar failures, and cache format problems. Commands convert these into
//! `anyhow` errors at the boundary; read paths in the cache layer catch
//! [`LectioError::Cache`] and degrade to a miss instead of propagating.

use std::fmt;

/// Errors produced by the passage model, parser, and cache layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectioError {
    /// Malformed entity construction: empty book/text, non-positive
    /// chapter/verse, inverted highlight range, zero highlight count.
    Validation(String),
    /// A highlight position fell outside the passage or verse bounds.
    /// Carries the offending index and the actual bound.
    Range {
        what: &'static str,
        index: usize,
        bound: usize,
    },
    /// Unrecognized reference grammar or unparseable legacy cache text.
    /// Carries the original input for diagnostics.
    Parse(String),
    /// Corrupt cache JSON, missing required keys, or an unsupported
    /// format version.
    Cache(String),
}

impl fmt::Display for LectioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LectioError::Validation(msg) => write!(f, "validation failed: {}", msg),
            LectioError::Range { what, index, bound } => {
                write!(f, "{} index {} is beyond bound {}", what, index, bound)
            }
            LectioError::Parse(input) => write!(f, "could not parse: {}", input),
            LectioError::Cache(msg) => write!(f, "cache error: {}", msg),
        }
    }
}

impl std::error::Error for LectioError {}

/// Convenience alias used throughout the model and parser modules.
pub type Result<T> = std::result::Result<T, LectioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_offending_index_and_bound() {
        let err = LectioError::Range {
            what: "start word",
            index: 12,
            bound: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn test_parse_error_carries_input() {
        let err = LectioError::Parse("Not A Reference".to_string());
        assert!(err.to_string().contains("Not A Reference"));
    }
}
