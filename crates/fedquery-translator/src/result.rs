//! Translation request and result types.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use fedquery_criteria::{QueryId, SearchQuery, SortCriterion};

use crate::input::QueryGroup;

/// Groups plus the query-level options carried into the built query.
///
/// # Example
///
/// ```rust
/// use fedquery_translator::{QueryGroup, QueryItem, TranslationRequest};
/// use fedquery_criteria::SortCriterion;
///
/// let request = TranslationRequest::new(vec![QueryGroup::new(vec![
///     QueryItem::new("\\\\i2b2\\Demographics\\Gender\\F\\"),
/// ])])
/// .with_query_id("q-17")
/// .with_sort(SortCriterion::asc("id"))
/// .with_page(0, 50);
///
/// assert_eq!(request.max_results, Some(50));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TranslationRequest {
    /// Identifier copied onto the query.
    pub query_id: Option<QueryId>,
    /// Groups, ANDed together.
    pub groups: Vec<QueryGroup>,
    /// Result ordering.
    pub sort_criteria: Vec<SortCriterion>,
    /// Pagination offset.
    pub first_result: Option<u32>,
    /// Pagination limit.
    pub max_results: Option<u32>,
}

impl TranslationRequest {
    /// Creates a request with no query-level options.
    pub fn new(groups: Vec<QueryGroup>) -> Self {
        Self {
            groups,
            ..Self::default()
        }
    }

    /// Sets the query identifier.
    pub fn with_query_id(mut self, id: impl Into<QueryId>) -> Self {
        self.query_id = Some(id.into());
        self
    }

    /// Appends a sort criterion.
    pub fn with_sort(mut self, sort: SortCriterion) -> Self {
        self.sort_criteria.push(sort);
        self
    }

    /// Sets the pagination window.
    pub fn with_page(mut self, first_result: u32, max_results: u32) -> Self {
        self.first_result = Some(first_result);
        self.max_results = Some(max_results);
        self
    }

    /// Structural fingerprint, reported in cache trace events.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// An item the translator ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedItem {
    /// Zero-based index of the group holding the item.
    pub group_index: usize,
    /// Raw key of the item.
    pub item_key: String,
    /// Why the item contributed nothing.
    pub reason: SkipReason,
}

/// Why an item contributed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkipReason {
    /// The key did not parse.
    UnparsableKey,
    /// No classification rule matched the key.
    UnknownKeyType,
    /// A demographic item whose domain expanded to nothing.
    EmptyDomain,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::UnparsableKey => "unparsable item key",
            SkipReason::UnknownKeyType => "unknown key type",
            SkipReason::EmptyDomain => "empty domain",
        };
        f.write_str(text)
    }
}

/// Result of translating a request.
#[derive(Debug, Clone)]
pub struct Translation {
    /// The built query.
    pub query: SearchQuery,
    /// Items ignored during translation.
    pub skipped_items: Vec<SkippedItem>,
    /// Translation statistics.
    pub stats: TranslationStats,
}

impl Translation {
    /// Returns true if every item contributed a criterion.
    pub fn is_complete(&self) -> bool {
        self.skipped_items.is_empty()
    }
}

/// Statistics from a translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationStats {
    /// Total translation duration.
    pub duration: Duration,
    /// Number of groups in the request.
    pub groups: usize,
    /// Groups that contributed a criterion to the root conjunction.
    pub contributing_groups: usize,
    /// Groups isolated in a correlated sub-query.
    pub subqueries: usize,
    /// Whether the result was served from cache.
    pub cache_hit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::QueryItem;

    fn request(key: &str) -> TranslationRequest {
        TranslationRequest::new(vec![QueryGroup::new(vec![QueryItem::new(key)])])
    }

    #[test]
    fn test_fingerprint_is_structural() {
        let a = request("\\\\i2b2\\Labs\\LOINC\\2345-7\\");
        let b = request("\\\\i2b2\\Labs\\LOINC\\2345-7\\");
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_covers_options() {
        let plain = request("\\\\i2b2\\Labs\\LOINC\\2345-7\\");
        let paged = plain.clone().with_page(10, 20);
        assert_ne!(plain.fingerprint(), paged.fingerprint());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::UnknownKeyType.to_string(), "unknown key type");
        assert_eq!(SkipReason::UnparsableKey.to_string(), "unparsable item key");
    }
}
