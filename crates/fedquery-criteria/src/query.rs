//! Search query container.
//!
//! A [`SearchQuery`] wraps a root criterion with the query-level options a
//! downstream compiler needs: the pivot entity, join aliases, sort order and
//! pagination. Queries are assembled once through [`SearchQueryBuilder`] and
//! are read-only afterwards, so they can be cached and shared across threads.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::criterion::Criterion;
use crate::error::{CriteriaError, CriteriaResult};

/// Identifier assigned to a query by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryId(String);

impl QueryId {
    /// Creates a query id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QueryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for QueryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// One sort key. Sort keys apply in list order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortCriterion {
    /// The sorted property path.
    pub field_name: String,
    /// The direction.
    pub direction: SortDirection,
}

impl SortCriterion {
    /// Ascending sort on `field_name`.
    pub fn asc(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            direction: SortDirection::Ascending,
        }
    }

    /// Descending sort on `field_name`.
    pub fn desc(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            direction: SortDirection::Descending,
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{} ASC", self.field_name),
            SortDirection::Descending => write!(f, "{} DESC", self.field_name),
        }
    }
}

/// A join alias reachable from the root object.
///
/// Declares that `name` refers to the association reached from the root
/// object along `join_path`, typed as `association_object_type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    /// Entity type of the joined association (e.g. `Observation`).
    pub association_object_type: String,
    /// Alias name used as the prefix of dotted property paths.
    pub name: String,
    /// Association path from the root object.
    pub join_path: String,
}

impl Alias {
    /// Creates an alias.
    pub fn new(
        association_object_type: impl Into<String>,
        name: impl Into<String>,
        join_path: impl Into<String>,
    ) -> Self {
        Self {
            association_object_type: association_object_type.into(),
            name: name.into(),
            join_path: join_path.into(),
        }
    }

    /// Qualifies a property with this alias: `"<name>.<property>"`.
    pub fn qualify(&self, property: &str) -> String {
        format!("{}.{}", self.name, property)
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} AS {} ({})",
            self.join_path, self.name, self.association_object_type
        )
    }
}

/// A complete, read-only logical query.
///
/// Equality follows [`structural_hash`](Self::structural_hash), with the same
/// collision caveat as [`Criterion`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchQuery {
    id: Option<QueryId>,
    root_object_name: String,
    root_criterion: Criterion,
    sort_criteria: Vec<SortCriterion>,
    aliases: Vec<Alias>,
    first_result: Option<u32>,
    max_results: Option<u32>,
}

impl SearchQuery {
    /// Starts building a query over `root_object_name` filtered by
    /// `root_criterion`.
    pub fn builder(
        root_object_name: impl Into<String>,
        root_criterion: Criterion,
    ) -> SearchQueryBuilder {
        SearchQueryBuilder::new(root_object_name, root_criterion)
    }

    /// Caller-assigned id, if any.
    pub fn id(&self) -> Option<&QueryId> {
        self.id.as_ref()
    }

    /// Name of the entity the query pivots on.
    pub fn root_object_name(&self) -> &str {
        &self.root_object_name
    }

    /// The root of the criterion tree.
    pub fn root_criterion(&self) -> &Criterion {
        &self.root_criterion
    }

    /// Sort keys, in application order.
    pub fn sort_criteria(&self) -> &[SortCriterion] {
        &self.sort_criteria
    }

    /// Join aliases declared for this query's scope.
    pub fn aliases(&self) -> &[Alias] {
        &self.aliases
    }

    /// Looks up a declared alias by name.
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|a| a.name == name)
    }

    /// Index of the first result to return.
    pub fn first_result(&self) -> Option<u32> {
        self.first_result
    }

    /// Maximum number of results to return.
    pub fn max_results(&self) -> Option<u32> {
        self.max_results
    }

    /// Alias names referenced by dotted property paths in the root criterion.
    ///
    /// Nested sub-queries are their own alias scope and are not inspected.
    pub fn referenced_aliases(&self) -> BTreeSet<&str> {
        referenced_aliases(&self.root_criterion)
    }

    /// Referenced alias names that are not declared on this query.
    pub fn undeclared_aliases(&self) -> Vec<&str> {
        self.referenced_aliases()
            .into_iter()
            .filter(|name| self.alias(name).is_none())
            .collect()
    }

    /// Structural hash of the whole query.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn referenced_aliases(criterion: &Criterion) -> BTreeSet<&str> {
    criterion
        .property_paths()
        .into_iter()
        .filter_map(|path| path.split_once('.').map(|(alias, _)| alias))
        .collect()
}

impl Hash for SearchQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.root_object_name.hash(state);
        self.root_criterion.hash(state);
        self.sort_criteria.hash(state);
        self.aliases.hash(state);
        self.first_result.hash(state);
        self.max_results.hash(state);
    }
}

impl PartialEq for SearchQuery {
    fn eq(&self, other: &Self) -> bool {
        self.structural_hash() == other.structural_hash()
    }
}

impl Eq for SearchQuery {}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FROM {}", self.root_object_name)?;
        for alias in &self.aliases {
            write!(f, " JOIN {}", alias)?;
        }
        write!(f, " WHERE {}", self.root_criterion)?;
        if !self.sort_criteria.is_empty() {
            let keys: Vec<String> = self.sort_criteria.iter().map(|s| s.to_string()).collect();
            write!(f, " ORDER BY {}", keys.join(", "))?;
        }
        if let Some(first) = self.first_result {
            write!(f, " OFFSET {}", first)?;
        }
        if let Some(max) = self.max_results {
            write!(f, " LIMIT {}", max)?;
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Single-use builder for [`SearchQuery`], consumed by [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    id: Option<QueryId>,
    root_object_name: String,
    root_criterion: Criterion,
    sort_criteria: Vec<SortCriterion>,
    aliases: Vec<Alias>,
    first_result: Option<u32>,
    max_results: Option<u32>,
}

impl SearchQueryBuilder {
    /// Creates a builder; see [`SearchQuery::builder`].
    pub fn new(root_object_name: impl Into<String>, root_criterion: Criterion) -> Self {
        Self {
            id: None,
            root_object_name: root_object_name.into(),
            root_criterion,
            sort_criteria: Vec::new(),
            aliases: Vec::new(),
            first_result: None,
            max_results: None,
        }
    }

    /// Sets the query id.
    pub fn id(mut self, id: impl Into<QueryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets or clears the query id.
    pub fn maybe_id(mut self, id: Option<QueryId>) -> Self {
        self.id = id;
        self
    }

    /// Appends a sort key.
    pub fn sort(mut self, sort: SortCriterion) -> Self {
        self.sort_criteria.push(sort);
        self
    }

    /// Appends several sort keys.
    pub fn sorts(mut self, sorts: impl IntoIterator<Item = SortCriterion>) -> Self {
        self.sort_criteria.extend(sorts);
        self
    }

    /// Declares an alias.
    pub fn alias(mut self, alias: Alias) -> Self {
        self.aliases.push(alias);
        self
    }

    /// Declares several aliases.
    pub fn aliases(mut self, aliases: impl IntoIterator<Item = Alias>) -> Self {
        self.aliases.extend(aliases);
        self
    }

    /// Sets the index of the first result.
    pub fn first_result(mut self, first: u32) -> Self {
        self.first_result = Some(first);
        self
    }

    /// Sets the maximum number of results.
    pub fn max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Validates and builds the query.
    ///
    /// Identical alias declarations are merged. Fails if the root object
    /// name is blank, if one alias name is declared with two different join
    /// targets, or if the root criterion references an alias that was never
    /// declared.
    pub fn build(self) -> CriteriaResult<SearchQuery> {
        if self.root_object_name.trim().is_empty() {
            return Err(CriteriaError::query("root object name is empty"));
        }

        let mut aliases: Vec<Alias> = Vec::with_capacity(self.aliases.len());
        for alias in self.aliases {
            match aliases.iter().find(|a| a.name == alias.name) {
                Some(existing) if *existing == alias => {}
                Some(existing) => {
                    return Err(CriteriaError::query(format!(
                        "alias '{}' declared as both '{}' and '{}'",
                        alias.name, existing, alias
                    )));
                }
                None => aliases.push(alias),
            }
        }

        let missing: Vec<&str> = referenced_aliases(&self.root_criterion)
            .into_iter()
            .filter(|name| !aliases.iter().any(|a| a.name == *name))
            .collect();
        if !missing.is_empty() {
            return Err(CriteriaError::query(format!(
                "criterion references undeclared alias(es): {}",
                missing.join(", ")
            )));
        }

        Ok(SearchQuery {
            id: self.id,
            root_object_name: self.root_object_name,
            root_criterion: self.root_criterion,
            sort_criteria: self.sort_criteria,
            aliases,
            first_result: self.first_result,
            max_results: self.max_results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::{Junction, JunctionKind, Relation, Value};

    fn eq(property: &str, value: &str) -> Criterion {
        Criterion::Simple {
            relation: Relation::Eq,
            property: property.to_string(),
            value: Value::from(value),
            ignore_case: false,
        }
    }

    fn obs1() -> Alias {
        Alias::new("Observation", "obs1", "observations")
    }

    #[test]
    fn test_build_minimal_query() {
        let query = SearchQuery::builder("Person", eq("gender", "F"))
            .build()
            .unwrap();
        assert_eq!(query.root_object_name(), "Person");
        assert!(query.aliases().is_empty());
        assert!(query.id().is_none());
    }

    #[test]
    fn test_build_rejects_blank_root() {
        let err = SearchQuery::builder("  ", eq("gender", "F"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidQuery { .. }));
    }

    #[test]
    fn test_build_rejects_undeclared_alias() {
        let err = SearchQuery::builder("Person", eq("obs1.observation", "x"))
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid query: criterion references undeclared alias(es): obs1"
        );
    }

    #[test]
    fn test_build_merges_identical_aliases() {
        let query = SearchQuery::builder("Person", eq("obs1.observation", "x"))
            .alias(obs1())
            .alias(obs1())
            .build()
            .unwrap();
        assert_eq!(query.aliases().len(), 1);
        assert!(query.undeclared_aliases().is_empty());
    }

    #[test]
    fn test_build_rejects_conflicting_aliases() {
        let err = SearchQuery::builder("Person", eq("gender", "F"))
            .alias(obs1())
            .alias(Alias::new("Order", "obs1", "orders"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidQuery { .. }));
    }

    #[test]
    fn test_subquery_aliases_are_scoped() {
        let inner = SearchQuery::builder("Person", eq("obs2.observation", "x"))
            .alias(Alias::new("Observation", "obs2", "observations"))
            .build()
            .unwrap();
        let outer = SearchQuery::builder(
            "Person",
            Criterion::InSubquery {
                property: "id".into(),
                subquery: Box::new(inner),
            },
        )
        .build()
        .unwrap();
        assert!(outer.referenced_aliases().is_empty());
    }

    #[test]
    fn test_display_with_options() {
        let root = Criterion::from(
            Junction::new(JunctionKind::Conjunction)
                .with(eq("obs1.observation", "x"))
                .with(eq("gender", "F")),
        );
        let query = SearchQuery::builder("Person", root)
            .id("q-1")
            .alias(obs1())
            .sort(SortCriterion::desc("dateOfBirth"))
            .first_result(10)
            .max_results(5)
            .build()
            .unwrap();
        assert_eq!(
            query.to_string(),
            "FROM Person JOIN observations AS obs1 (Observation) \
             WHERE (obs1.observation = 'x' AND gender = 'F') \
             ORDER BY dateOfBirth DESC OFFSET 10 LIMIT 5"
        );
        assert_eq!(query.id().map(|id| id.as_str()), Some("q-1"));
    }

    #[test]
    fn test_query_equality_is_structural() {
        let a = SearchQuery::builder("Person", eq("gender", "F"))
            .build()
            .unwrap();
        let b = SearchQuery::builder("Person", eq("gender", "F"))
            .build()
            .unwrap();
        let c = SearchQuery::builder("Person", eq("gender", "M"))
            .build()
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.structural_hash(), b.structural_hash());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_query_survives_json() {
        let query = SearchQuery::builder("Person", eq("obs1.observation", "2345-7"))
            .alias(obs1())
            .max_results(100)
            .build()
            .unwrap();
        let json = serde_json::to_string(&query).unwrap();
        let back: SearchQuery = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query);
        assert_eq!(back.aliases(), query.aliases());
    }
}
