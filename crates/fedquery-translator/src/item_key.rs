//! Item-key parser implementation using nom.
//!
//! Query-builder concept keys have the hierarchical form
//! `\\TABLE\segment\segment\...\`: an optional table name introduced by a
//! double backslash, followed by one or more backslash-separated path
//! segments and an optional trailing backslash.

use std::fmt;

use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::char,
    combinator::{all_consuming, opt},
    multi::many1,
    sequence::preceded,
    IResult,
};

use crate::error::{TranslatorError, TranslatorResult};

/// A parsed concept key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Table name from the `\\TABLE` prefix, if present.
    pub table: Option<String>,
    /// Path segments, root first.
    pub segments: Vec<String>,
}

impl ItemKey {
    /// Returns true if `pattern` occurs as a contiguous run of segments,
    /// compared case-insensitively.
    pub fn matches_path(&self, pattern: &[&str]) -> bool {
        if pattern.is_empty() || pattern.len() > self.segments.len() {
            return false;
        }
        self.segments.windows(pattern.len()).any(|window| {
            window
                .iter()
                .zip(pattern)
                .all(|(segment, expected)| segment.eq_ignore_ascii_case(expected))
        })
    }

    /// The table-less, wildcard-suffixed key handed to domain expansion:
    /// `\seg1\seg2\...\%`.
    pub fn domain_pattern(&self) -> String {
        let mut pattern = String::new();
        for segment in &self.segments {
            pattern.push('\\');
            pattern.push_str(segment);
        }
        pattern.push_str("\\%");
        pattern
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(table) = &self.table {
            write!(f, "\\\\{}", table)?;
        }
        for segment in &self.segments {
            write!(f, "\\{}", segment)?;
        }
        write!(f, "\\")
    }
}

/// Parse an item key.
///
/// # Examples
///
/// ```rust
/// use fedquery_translator::parse_item_key;
///
/// let key = parse_item_key("\\\\i2b2\\Labs\\LOINC\\2345-7\\").unwrap();
/// assert_eq!(key.table.as_deref(), Some("i2b2"));
/// assert_eq!(key.segments, vec!["Labs", "LOINC", "2345-7"]);
/// assert_eq!(key.domain_pattern(), "\\Labs\\LOINC\\2345-7\\%");
/// ```
pub fn parse_item_key(input: &str) -> TranslatorResult<ItemKey> {
    let trimmed = input.trim();
    let offset = input.len() - input.trim_start().len();

    match all_consuming(item_key)(trimmed) {
        Ok((_, key)) => Ok(key),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(TranslatorError::InvalidItemKey {
                key: input.to_string(),
                position: offset + trimmed.len() - e.input.len(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(TranslatorError::InvalidItemKey {
            key: input.to_string(),
            position: input.len(),
        }),
    }
}

// ============================================================================
// Grammar
// ============================================================================

fn item_key(input: &str) -> IResult<&str, ItemKey> {
    let (input, table) = opt(table)(input)?;
    let (input, segments) = many1(preceded(char('\\'), segment))(input)?;
    let (input, _) = opt(char('\\'))(input)?;
    Ok((
        input,
        ItemKey {
            table: table.map(str::to_string),
            segments: segments.into_iter().map(str::to_string).collect(),
        },
    ))
}

fn table(input: &str) -> IResult<&str, &str> {
    preceded(tag("\\\\"), segment)(input)
}

fn segment(input: &str) -> IResult<&str, &str> {
    take_till1(|c| c == '\\')(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_table() {
        let key = parse_item_key("\\\\i2b2\\Diagnoses\\ICD9\\250\\").unwrap();
        assert_eq!(key.table.as_deref(), Some("i2b2"));
        assert_eq!(key.segments, vec!["Diagnoses", "ICD9", "250"]);
        assert_eq!(key.segments.last().map(String::as_str), Some("250"));
    }

    #[test]
    fn test_parse_without_table() {
        let key = parse_item_key("\\Demographics\\Gender\\F").unwrap();
        assert!(key.table.is_none());
        assert_eq!(key.segments, vec!["Demographics", "Gender", "F"]);
    }

    #[test]
    fn test_parse_segments_with_spaces() {
        let key = parse_item_key("\\\\i2b2\\Encounters\\Length of Stay\\> 10 days\\").unwrap();
        assert_eq!(key.segments[1], "Length of Stay");
        assert_eq!(key.segments[2], "> 10 days");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let key = parse_item_key("  \\Labs\\LOINC\\  ").unwrap();
        assert_eq!(key.segments, vec!["Labs", "LOINC"]);
    }

    #[test]
    fn test_parse_empty_fails() {
        assert!(matches!(
            parse_item_key(""),
            Err(TranslatorError::InvalidItemKey { position: 0, .. })
        ));
    }

    #[test]
    fn test_parse_missing_leading_backslash_fails() {
        let err = parse_item_key("Labs\\LOINC").unwrap_err();
        assert_eq!(
            err,
            TranslatorError::InvalidItemKey {
                key: "Labs\\LOINC".to_string(),
                position: 0,
            }
        );
    }

    #[test]
    fn test_parse_empty_segment_fails() {
        let err = parse_item_key("\\Labs\\\\\\LOINC\\").unwrap_err();
        assert!(matches!(err, TranslatorError::InvalidItemKey { position: 6, .. }));
    }

    #[test]
    fn test_matches_path_contiguous_case_insensitive() {
        let key = parse_item_key("\\\\i2b2\\Labs\\LOINC\\2345-7\\").unwrap();
        assert!(key.matches_path(&["labs", "loinc"]));
        assert!(key.matches_path(&["LOINC"]));
        assert!(!key.matches_path(&["Labs", "2345-7"]));
        assert!(!key.matches_path(&[]));
    }

    #[test]
    fn test_domain_pattern_drops_table() {
        let key = parse_item_key("\\\\i2b2\\Diagnoses\\ICD9\\250\\").unwrap();
        assert_eq!(key.domain_pattern(), "\\Diagnoses\\ICD9\\250\\%");
    }

    #[test]
    fn test_display_round_trip_shape() {
        let key = parse_item_key("\\\\i2b2\\Labs\\LOINC").unwrap();
        assert_eq!(key.to_string(), "\\\\i2b2\\Labs\\LOINC\\");
    }
}
