//! Criterion kind tags and their declared arities.

use std::fmt;

/// Number of parameters a criterion kind takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// Exactly this many parameters.
    Fixed(usize),
    /// Any number of parameters, including none.
    Unbounded,
}

impl Arity {
    /// Returns true if `count` parameters satisfy this arity.
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == count,
            Arity::Unbounded => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(1) => write!(f, "1 parameter"),
            Arity::Fixed(n) => write!(f, "{} parameters", n),
            Arity::Unbounded => write!(f, "any number of parameters"),
        }
    }
}

/// Tag naming every kind of [`Criterion`](crate::Criterion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SearchType {
    /// `property IS NULL`
    IsNull,
    /// `property IS NOT NULL`
    IsNotNull,
    /// `property IS EMPTY`
    IsEmpty,
    /// `property IS NOT EMPTY`
    IsNotEmpty,
    /// `property <relation> value`
    Simple,
    /// `property BETWEEN low AND high`
    Between,
    /// `property LIKE pattern`
    Like,
    /// `property ILIKE pattern`
    Ilike,
    /// `property <relation> other_property`
    PropertyCompare,
    /// `size(property) <relation> n`
    SizeCompare,
    /// `property IN (values)`
    In,
    /// `property IN (subquery)`
    InSubquery,
    /// `count(subquery) <relation> n`
    Count,
    /// `NOT child`
    Not,
    /// `left AND right`
    And,
    /// `left OR right`
    Or,
    /// n-ary AND
    Conjunction,
    /// n-ary OR
    Disjunction,
    /// n-ary UNION
    Union,
    /// n-ary INTERSECT
    Intersection,
    /// raw SQL
    SqlRestriction,
}

impl SearchType {
    /// All search types, in declaration order.
    pub const ALL: [SearchType; 21] = [
        SearchType::IsNull,
        SearchType::IsNotNull,
        SearchType::IsEmpty,
        SearchType::IsNotEmpty,
        SearchType::Simple,
        SearchType::Between,
        SearchType::Like,
        SearchType::Ilike,
        SearchType::PropertyCompare,
        SearchType::SizeCompare,
        SearchType::In,
        SearchType::InSubquery,
        SearchType::Count,
        SearchType::Not,
        SearchType::And,
        SearchType::Or,
        SearchType::Conjunction,
        SearchType::Disjunction,
        SearchType::Union,
        SearchType::Intersection,
        SearchType::SqlRestriction,
    ];

    /// The declared parameter arity of this kind.
    ///
    /// | Kind | Parameters |
    /// |------|------------|
    /// | null/empty tests | property |
    /// | `Simple`, `PropertyCompare`, `SizeCompare` | relation, property, operand |
    /// | `Between` | property, low, high |
    /// | `Like`, `Ilike` | property, value, match mode, escape |
    /// | `In`, `InSubquery` | property, values or query |
    /// | `Count` | relation, count, query |
    /// | `Not` | child |
    /// | `And`, `Or` | left, right |
    /// | junctions, set operations | unbounded |
    /// | `SqlRestriction` | sql |
    pub fn arity(&self) -> Arity {
        match self {
            SearchType::IsNull
            | SearchType::IsNotNull
            | SearchType::IsEmpty
            | SearchType::IsNotEmpty
            | SearchType::Not
            | SearchType::SqlRestriction => Arity::Fixed(1),
            SearchType::In | SearchType::InSubquery | SearchType::And | SearchType::Or => {
                Arity::Fixed(2)
            }
            SearchType::Simple
            | SearchType::Between
            | SearchType::PropertyCompare
            | SearchType::SizeCompare
            | SearchType::Count => Arity::Fixed(3),
            SearchType::Like | SearchType::Ilike => Arity::Fixed(4),
            SearchType::Conjunction
            | SearchType::Disjunction
            | SearchType::Union
            | SearchType::Intersection => Arity::Unbounded,
        }
    }

    /// Returns true for kinds whose parameters are other criteria.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            SearchType::Not
                | SearchType::And
                | SearchType::Or
                | SearchType::Conjunction
                | SearchType::Disjunction
                | SearchType::Union
                | SearchType::Intersection
        )
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchType::IsNull => "IS_NULL",
            SearchType::IsNotNull => "IS_NOT_NULL",
            SearchType::IsEmpty => "IS_EMPTY",
            SearchType::IsNotEmpty => "IS_NOT_EMPTY",
            SearchType::Simple => "SIMPLE",
            SearchType::Between => "BETWEEN",
            SearchType::Like => "LIKE",
            SearchType::Ilike => "ILIKE",
            SearchType::PropertyCompare => "PROPERTY",
            SearchType::SizeCompare => "SIZE",
            SearchType::In => "IN",
            SearchType::InSubquery => "IN_SUBQUERY",
            SearchType::Count => "COUNT",
            SearchType::Not => "NOT",
            SearchType::And => "AND",
            SearchType::Or => "OR",
            SearchType::Conjunction => "CONJUNCTION",
            SearchType::Disjunction => "DISJUNCTION",
            SearchType::Union => "UNION",
            SearchType::Intersection => "INTERSECTION",
            SearchType::SqlRestriction => "SQL_RESTRICTION",
        };
        write!(f, "{}", name)
    }
}
