//! Arity- and kind-checked criterion constructors.
//!
//! There is one constructor per criterion kind, each taking exactly the
//! parameters that kind needs. Constructors whose kind argument could be
//! wrong ([`unary`], [`binary`], [`junction`], [`set_operation`]) and the
//! generic [`create`] entry point return [`CriteriaError::InvalidCriterionShape`]
//! on misuse, so no partially-built criterion is ever observable.
//!
//! # IN-list partitioning
//!
//! Backends cap the number of bind parameters in one `IN` list.
//! [`collection_in`] splits long value lists into contiguous chunks of at
//! most `max_in` values and ORs the chunks together:
//!
//! ```rust
//! use fedquery_criteria::{factory, Criterion, JunctionKind, Value};
//!
//! let values: Vec<Value> = (0..2500).map(Value::from).collect();
//! let criterion = factory::collection_in("code", values, 1000).unwrap();
//! assert!(criterion.is_junction(JunctionKind::Disjunction));
//! assert_eq!(criterion.children().len(), 3);
//! ```

use crate::criterion::{
    BinaryKind, Criterion, Junction, JunctionKind, MatchMode, NoArgKind, Relation, SetOpKind,
    StringMatchKind, Value,
};
use crate::error::{CriteriaError, CriteriaResult};
use crate::query::SearchQuery;
use crate::search_type::SearchType;

/// Default ceiling on values per `IN` list.
pub const DEFAULT_MAX_IN: usize = 1000;

// =============================================================================
// Leaf constructors
// =============================================================================

/// `property IS NULL`.
pub fn is_null(property: impl Into<String>) -> Criterion {
    no_arg(NoArgKind::IsNull, property)
}

/// `property IS NOT NULL`.
pub fn is_not_null(property: impl Into<String>) -> Criterion {
    no_arg(NoArgKind::IsNotNull, property)
}

/// Collection `property` has no elements.
pub fn is_empty(property: impl Into<String>) -> Criterion {
    no_arg(NoArgKind::IsEmpty, property)
}

/// Collection `property` has at least one element.
pub fn is_not_empty(property: impl Into<String>) -> Criterion {
    no_arg(NoArgKind::IsNotEmpty, property)
}

fn no_arg(kind: NoArgKind, property: impl Into<String>) -> Criterion {
    Criterion::NoArg {
        kind,
        property: property.into(),
    }
}

/// `property <relation> value`.
pub fn simple_expression(
    relation: Relation,
    property: impl Into<String>,
    value: impl Into<Value>,
) -> Criterion {
    Criterion::Simple {
        relation,
        property: property.into(),
        value: value.into(),
        ignore_case: false,
    }
}

/// Case-insensitive `property <relation> value`.
pub fn simple_expression_ignore_case(
    relation: Relation,
    property: impl Into<String>,
    value: impl Into<Value>,
) -> Criterion {
    Criterion::Simple {
        relation,
        property: property.into(),
        value: value.into(),
        ignore_case: true,
    }
}

/// `property BETWEEN low AND high`.
pub fn range(
    property: impl Into<String>,
    low: impl Into<Value>,
    high: impl Into<Value>,
) -> Criterion {
    Criterion::Between {
        property: property.into(),
        low: low.into(),
        high: high.into(),
    }
}

/// `property LIKE pattern`.
pub fn like(
    property: impl Into<String>,
    value: impl Into<String>,
    match_mode: MatchMode,
) -> Criterion {
    string_match(StringMatchKind::Like, property, value, match_mode, None)
}

/// `property ILIKE pattern`.
pub fn ilike(
    property: impl Into<String>,
    value: impl Into<String>,
    match_mode: MatchMode,
) -> Criterion {
    string_match(StringMatchKind::Ilike, property, value, match_mode, None)
}

/// Pattern match with an explicit escape character.
pub fn string_match(
    kind: StringMatchKind,
    property: impl Into<String>,
    value: impl Into<String>,
    match_mode: MatchMode,
    escape_char: Option<char>,
) -> Criterion {
    Criterion::StringMatch {
        kind,
        property: property.into(),
        value: value.into(),
        match_mode,
        escape_char,
    }
}

/// `property <relation> other_property`.
pub fn property_expression(
    relation: Relation,
    property: impl Into<String>,
    other_property: impl Into<String>,
) -> Criterion {
    Criterion::PropertyCompare {
        relation,
        property: property.into(),
        other_property: other_property.into(),
    }
}

/// `size(property) <relation> size`.
pub fn size_expression(relation: Relation, property: impl Into<String>, size: i64) -> Criterion {
    Criterion::SizeCompare {
        relation,
        property: property.into(),
        size,
    }
}

/// `property IN (values)`, partitioned so no `IN` list exceeds `max_in`.
///
/// - one value: `property = value`;
/// - up to `max_in` values: a single `IN`;
/// - more: a disjunction of `ceil(len / max_in)` contiguous `IN` chunks, each
///   value appearing in exactly one chunk.
///
/// An empty `values` list or a zero `max_in` is rejected.
pub fn collection_in(
    property: impl Into<String>,
    values: Vec<Value>,
    max_in: usize,
) -> CriteriaResult<Criterion> {
    if max_in == 0 {
        return Err(CriteriaError::shape("IN ceiling of at least 1", "0"));
    }
    let property = property.into();
    match values.len() {
        0 => Err(CriteriaError::shape("at least one IN value", "0 values")),
        1 => {
            let mut values = values;
            let value = values.remove(0);
            Ok(simple_expression(Relation::Eq, property, value))
        }
        n if n <= max_in => Ok(Criterion::InSet { property, values }),
        _ => {
            let mut disjunction = Junction::new(JunctionKind::Disjunction);
            for chunk in values.chunks(max_in) {
                disjunction.add(Criterion::InSet {
                    property: property.clone(),
                    values: chunk.to_vec(),
                });
            }
            Ok(disjunction.into())
        }
    }
}

/// `property IN (subquery)`.
pub fn collection_sub_query(property: impl Into<String>, subquery: SearchQuery) -> Criterion {
    Criterion::InSubquery {
        property: property.into(),
        subquery: Box::new(subquery),
    }
}

/// `count(subquery) <relation> value`.
pub fn count(relation: Relation, value: i64, subquery: SearchQuery) -> Criterion {
    Criterion::Count {
        relation,
        value,
        subquery: Box::new(subquery),
    }
}

/// Raw SQL restriction.
pub fn sql_restriction(sql: impl Into<String>) -> Criterion {
    Criterion::SqlRestriction { sql: sql.into() }
}

// =============================================================================
// Composite constructors
// =============================================================================

/// Single-operand composite. Only [`SearchType::Not`] is accepted.
pub fn unary(kind: SearchType, child: Criterion) -> CriteriaResult<Criterion> {
    match kind {
        SearchType::Not => Ok(Criterion::Not(Box::new(child))),
        other => Err(CriteriaError::shape("NOT", other.to_string())),
    }
}

/// Two-operand composite. Only [`SearchType::And`] and [`SearchType::Or`]
/// are accepted.
pub fn binary(kind: SearchType, left: Criterion, right: Criterion) -> CriteriaResult<Criterion> {
    let kind = match kind {
        SearchType::And => BinaryKind::And,
        SearchType::Or => BinaryKind::Or,
        other => return Err(CriteriaError::shape("AND or OR", other.to_string())),
    };
    Ok(Criterion::Binary {
        kind,
        left: Box::new(left),
        right: Box::new(right),
    })
}

/// An empty n-ary junction. Only [`SearchType::Conjunction`] and
/// [`SearchType::Disjunction`] are accepted.
pub fn junction(kind: SearchType) -> CriteriaResult<Junction> {
    match kind {
        SearchType::Conjunction => Ok(Junction::new(JunctionKind::Conjunction)),
        SearchType::Disjunction => Ok(Junction::new(JunctionKind::Disjunction)),
        other => Err(CriteriaError::shape(
            "CONJUNCTION or DISJUNCTION",
            other.to_string(),
        )),
    }
}

/// An n-ary set operation. Only [`SearchType::Union`] and
/// [`SearchType::Intersection`] are accepted.
pub fn set_operation(kind: SearchType, children: Vec<Criterion>) -> CriteriaResult<Criterion> {
    let kind = match kind {
        SearchType::Union => SetOpKind::Union,
        SearchType::Intersection => SetOpKind::Intersection,
        other => {
            return Err(CriteriaError::shape(
                "UNION or INTERSECTION",
                other.to_string(),
            ))
        }
    };
    Ok(Criterion::SetOp { kind, children })
}

// =============================================================================
// Generic, arity-checked construction
// =============================================================================

/// A loosely-typed constructor parameter for [`create`].
#[derive(Debug, Clone)]
pub enum Param {
    /// A comparison relation.
    Relation(Relation),
    /// A property path.
    Property(String),
    /// A literal value.
    Value(Value),
    /// A list of literal values.
    Values(Vec<Value>),
    /// A pattern match mode.
    MatchMode(MatchMode),
    /// An optional escape character.
    Escape(Option<char>),
    /// An integer operand (size or count).
    Integer(i64),
    /// An already-built sub-query.
    Query(SearchQuery),
    /// A child criterion.
    Criterion(Criterion),
    /// A raw SQL fragment.
    Sql(String),
}

impl Param {
    fn describe(&self) -> &'static str {
        match self {
            Param::Relation(_) => "relation",
            Param::Property(_) => "property",
            Param::Value(_) => "value",
            Param::Values(_) => "value list",
            Param::MatchMode(_) => "match mode",
            Param::Escape(_) => "escape character",
            Param::Integer(_) => "integer",
            Param::Query(_) => "query",
            Param::Criterion(_) => "criterion",
            Param::Sql(_) => "sql",
        }
    }
}

/// Builds a criterion of `search_type` from a parameter list.
///
/// The parameter count must match [`SearchType::arity`] and each parameter
/// must be of the kind the slot requires; anything else fails with
/// [`CriteriaError::InvalidCriterionShape`]. `In` partitions with
/// [`DEFAULT_MAX_IN`].
pub fn create(search_type: SearchType, params: Vec<Param>) -> CriteriaResult<Criterion> {
    let arity = search_type.arity();
    if !arity.accepts(params.len()) {
        return Err(CriteriaError::shape(
            format!("{} for {}", arity, search_type),
            format!("{} parameter(s)", params.len()),
        ));
    }
    if search_type.is_composite() {
        if let Some(other) = params.iter().find(|p| !matches!(p, Param::Criterion(_))) {
            return Err(CriteriaError::shape(
                format!("criterion for {}", search_type),
                other.describe(),
            ));
        }
    }

    let mut args = Params {
        search_type,
        inner: params.into_iter(),
    };

    let criterion = match search_type {
        SearchType::IsNull => is_null(args.property()?),
        SearchType::IsNotNull => is_not_null(args.property()?),
        SearchType::IsEmpty => is_empty(args.property()?),
        SearchType::IsNotEmpty => is_not_empty(args.property()?),
        SearchType::Simple => {
            let relation = args.relation()?;
            let property = args.property()?;
            simple_expression(relation, property, args.value()?)
        }
        SearchType::Between => {
            let property = args.property()?;
            let low = args.value()?;
            range(property, low, args.value()?)
        }
        SearchType::Like | SearchType::Ilike => {
            let kind = if search_type == SearchType::Like {
                StringMatchKind::Like
            } else {
                StringMatchKind::Ilike
            };
            let property = args.property()?;
            let value = match args.value()? {
                Value::String(s) => s,
                other => return Err(args.mismatch("text value", &format!("{:?}", other))),
            };
            let mode = args.match_mode()?;
            string_match(kind, property, value, mode, args.escape()?)
        }
        SearchType::PropertyCompare => {
            let relation = args.relation()?;
            let property = args.property()?;
            property_expression(relation, property, args.property()?)
        }
        SearchType::SizeCompare => {
            let relation = args.relation()?;
            let property = args.property()?;
            size_expression(relation, property, args.integer()?)
        }
        SearchType::In => {
            let property = args.property()?;
            collection_in(property, args.values()?, DEFAULT_MAX_IN)?
        }
        SearchType::InSubquery => {
            let property = args.property()?;
            collection_sub_query(property, args.query()?)
        }
        SearchType::Count => {
            let relation = args.relation()?;
            let value = args.integer()?;
            count(relation, value, args.query()?)
        }
        SearchType::Not => unary(SearchType::Not, args.criterion()?)?,
        SearchType::And | SearchType::Or => {
            let left = args.criterion()?;
            binary(search_type, left, args.criterion()?)?
        }
        SearchType::Conjunction | SearchType::Disjunction => {
            let mut j = junction(search_type)?;
            for child in args.remaining_criteria()? {
                j.add(child);
            }
            j.into()
        }
        SearchType::Union | SearchType::Intersection => {
            set_operation(search_type, args.remaining_criteria()?)?
        }
        SearchType::SqlRestriction => sql_restriction(args.sql()?),
    };
    Ok(criterion)
}

/// Typed reader over the positional parameters of [`create`].
struct Params {
    search_type: SearchType,
    inner: std::vec::IntoIter<Param>,
}

impl Params {
    fn mismatch(&self, expected: &str, got: &str) -> CriteriaError {
        CriteriaError::shape(format!("{} for {}", expected, self.search_type), got)
    }

    fn next(&mut self, expected: &str) -> CriteriaResult<Param> {
        let search_type = self.search_type;
        self.inner.next().ok_or_else(|| {
            CriteriaError::shape(format!("{} for {}", expected, search_type), "nothing")
        })
    }

    fn relation(&mut self) -> CriteriaResult<Relation> {
        match self.next("relation")? {
            Param::Relation(r) => Ok(r),
            other => Err(self.mismatch("relation", other.describe())),
        }
    }

    fn property(&mut self) -> CriteriaResult<String> {
        match self.next("property")? {
            Param::Property(p) if !p.trim().is_empty() => Ok(p),
            Param::Property(_) => Err(self.mismatch("property", "blank property")),
            other => Err(self.mismatch("property", other.describe())),
        }
    }

    fn value(&mut self) -> CriteriaResult<Value> {
        match self.next("value")? {
            Param::Value(v) => Ok(v),
            other => Err(self.mismatch("value", other.describe())),
        }
    }

    fn values(&mut self) -> CriteriaResult<Vec<Value>> {
        match self.next("value list")? {
            Param::Values(v) => Ok(v),
            other => Err(self.mismatch("value list", other.describe())),
        }
    }

    fn match_mode(&mut self) -> CriteriaResult<MatchMode> {
        match self.next("match mode")? {
            Param::MatchMode(m) => Ok(m),
            other => Err(self.mismatch("match mode", other.describe())),
        }
    }

    fn escape(&mut self) -> CriteriaResult<Option<char>> {
        match self.next("escape character")? {
            Param::Escape(c) => Ok(c),
            other => Err(self.mismatch("escape character", other.describe())),
        }
    }

    fn integer(&mut self) -> CriteriaResult<i64> {
        match self.next("integer")? {
            Param::Integer(n) => Ok(n),
            other => Err(self.mismatch("integer", other.describe())),
        }
    }

    fn query(&mut self) -> CriteriaResult<SearchQuery> {
        match self.next("query")? {
            Param::Query(q) => Ok(q),
            other => Err(self.mismatch("query", other.describe())),
        }
    }

    fn criterion(&mut self) -> CriteriaResult<Criterion> {
        match self.next("criterion")? {
            Param::Criterion(c) => Ok(c),
            other => Err(self.mismatch("criterion", other.describe())),
        }
    }

    fn sql(&mut self) -> CriteriaResult<String> {
        match self.next("sql")? {
            Param::Sql(s) => Ok(s),
            other => Err(self.mismatch("sql", other.describe())),
        }
    }

    fn remaining_criteria(&mut self) -> CriteriaResult<Vec<Criterion>> {
        let mut children = Vec::new();
        while let Some(param) = self.inner.next() {
            match param {
                Param::Criterion(c) => children.push(c),
                other => return Err(self.mismatch("criterion", other.describe())),
            }
        }
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(n: usize) -> Vec<Value> {
        (0..n).map(|i| Value::from(format!("C{}", i))).collect()
    }

    #[test]
    fn test_collection_in_single_value_is_equality() {
        let c = collection_in("code", vec![Value::from("2345-7")], 1000).unwrap();
        assert_eq!(c, simple_expression(Relation::Eq, "code", "2345-7"));
    }

    #[test]
    fn test_collection_in_under_limit_is_single_in() {
        let c = collection_in("code", codes(1000), 1000).unwrap();
        assert_eq!(c.search_type(), SearchType::In);
    }

    #[test]
    fn test_collection_in_over_limit_is_partitioned() {
        let c = collection_in("code", codes(1500), 1000).unwrap();
        let parts = c.children();
        assert!(c.is_junction(JunctionKind::Disjunction));
        assert_eq!(parts.len(), 2);
        let sizes: Vec<usize> = parts
            .iter()
            .map(|p| match p {
                Criterion::InSet { values, .. } => values.len(),
                other => panic!("expected IN chunk, got {}", other),
            })
            .collect();
        assert_eq!(sizes, vec![1000, 500]);
    }

    #[test]
    fn test_collection_in_empty_is_rejected() {
        let err = collection_in("code", vec![], 1000).unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidCriterionShape { .. }));
    }

    #[test]
    fn test_collection_in_zero_ceiling_is_rejected() {
        assert!(collection_in("code", codes(3), 0).is_err());
    }

    #[test]
    fn test_unary_rejects_non_not() {
        let child = is_null("a");
        assert!(unary(SearchType::Not, child.clone()).is_ok());
        let err = unary(SearchType::And, child).unwrap_err();
        assert_eq!(err, CriteriaError::shape("NOT", "AND"));
    }

    #[test]
    fn test_binary_rejects_non_and_or() {
        assert!(binary(SearchType::Or, is_null("a"), is_null("b")).is_ok());
        assert!(binary(SearchType::Not, is_null("a"), is_null("b")).is_err());
    }

    #[test]
    fn test_junction_rejects_leaf_kind() {
        assert!(junction(SearchType::Conjunction).unwrap().is_empty());
        assert!(junction(SearchType::Simple).is_err());
    }

    #[test]
    fn test_set_operation_kinds() {
        let c = set_operation(SearchType::Union, vec![is_null("a"), is_null("b")]).unwrap();
        assert_eq!(c.search_type(), SearchType::Union);
        assert!(set_operation(SearchType::Disjunction, vec![]).is_err());
    }

    #[test]
    fn test_create_simple() {
        let c = create(
            SearchType::Simple,
            vec![
                Param::Relation(Relation::Ge),
                Param::Property("age".into()),
                Param::Value(Value::from(60)),
            ],
        )
        .unwrap();
        assert_eq!(c, simple_expression(Relation::Ge, "age", 60));
    }

    #[test]
    fn test_create_wrong_kind_in_slot() {
        let err = create(
            SearchType::Simple,
            vec![
                Param::Property("age".into()),
                Param::Relation(Relation::Ge),
                Param::Value(Value::from(60)),
            ],
        )
        .unwrap_err();
        assert_eq!(err, CriteriaError::shape("relation for SIMPLE", "property"));
    }

    #[test]
    fn test_create_unbounded_accepts_zero_children() {
        let c = create(SearchType::Disjunction, vec![]).unwrap();
        assert!(c.is_junction(JunctionKind::Disjunction));
        assert!(c.children().is_empty());
    }

    #[test]
    fn test_create_junction_rejects_non_criterion_child() {
        let err = create(
            SearchType::Conjunction,
            vec![Param::Criterion(is_null("a")), Param::Sql("1 = 1".into())],
        )
        .unwrap_err();
        assert!(matches!(err, CriteriaError::InvalidCriterionShape { .. }));
    }

    #[test]
    fn test_create_like_requires_text_value() {
        let ok = create(
            SearchType::Like,
            vec![
                Param::Property("name".into()),
                Param::Value(Value::from("smi")),
                Param::MatchMode(MatchMode::Start),
                Param::Escape(None),
            ],
        );
        assert!(ok.is_ok());

        let err = create(
            SearchType::Like,
            vec![
                Param::Property("name".into()),
                Param::Value(Value::from(3)),
                Param::MatchMode(MatchMode::Start),
                Param::Escape(None),
            ],
        );
        assert!(err.is_err());
    }
}
