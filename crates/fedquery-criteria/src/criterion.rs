//! Criterion tree types.
//!
//! A [`Criterion`] is a closed tagged union: leaves compare a property against
//! a value, another property, a set of values or a sub-query, and composites
//! combine other criteria. Criteria are assembled bottom-up through the
//! constructors in [`crate::factory`] and are not mutated once the enclosing
//! [`SearchQuery`] has been built.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

use crate::query::SearchQuery;
use crate::search_type::SearchType;

// =============================================================================
// Operator kinds
// =============================================================================

/// Comparison relation for simple, property and size expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    /// Equal: `=`
    Eq,
    /// Not equal: `<>`
    Ne,
    /// Less than: `<`
    Lt,
    /// Less than or equal: `<=`
    Le,
    /// Greater than: `>`
    Gt,
    /// Greater than or equal: `>=`
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Eq => write!(f, "="),
            Relation::Ne => write!(f, "<>"),
            Relation::Lt => write!(f, "<"),
            Relation::Le => write!(f, "<="),
            Relation::Gt => write!(f, ">"),
            Relation::Ge => write!(f, ">="),
        }
    }
}

/// Property tests that take no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoArgKind {
    /// `property IS NULL`
    IsNull,
    /// `property IS NOT NULL`
    IsNotNull,
    /// Collection property has no elements.
    IsEmpty,
    /// Collection property has at least one element.
    IsNotEmpty,
}

impl fmt::Display for NoArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoArgKind::IsNull => write!(f, "IS NULL"),
            NoArgKind::IsNotNull => write!(f, "IS NOT NULL"),
            NoArgKind::IsEmpty => write!(f, "IS EMPTY"),
            NoArgKind::IsNotEmpty => write!(f, "IS NOT EMPTY"),
        }
    }
}

/// Pattern-matching operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StringMatchKind {
    /// Case-sensitive `LIKE`.
    Like,
    /// Case-insensitive `ILIKE`.
    Ilike,
}

impl fmt::Display for StringMatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringMatchKind::Like => write!(f, "LIKE"),
            StringMatchKind::Ilike => write!(f, "ILIKE"),
        }
    }
}

/// Where the match value may occur inside the property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MatchMode {
    /// Whole value must match.
    #[default]
    Exact,
    /// Value starts with the match value.
    Start,
    /// Value ends with the match value.
    End,
    /// Match value occurs anywhere.
    Anywhere,
}

impl MatchMode {
    /// Renders `value` as a SQL-style wildcard pattern for this mode.
    pub fn to_pattern(&self, value: &str) -> String {
        match self {
            MatchMode::Exact => value.to_string(),
            MatchMode::Start => format!("{}%", value),
            MatchMode::End => format!("%{}", value),
            MatchMode::Anywhere => format!("%{}%", value),
        }
    }
}

/// Two-operand logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryKind {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryKind::And => write!(f, "AND"),
            BinaryKind::Or => write!(f, "OR"),
        }
    }
}

/// N-ary logical operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JunctionKind {
    /// All children must hold.
    Conjunction,
    /// At least one child must hold.
    Disjunction,
}

impl JunctionKind {
    /// Infix keyword used when rendering children.
    pub fn keyword(&self) -> &'static str {
        match self {
            JunctionKind::Conjunction => "AND",
            JunctionKind::Disjunction => "OR",
        }
    }
}

/// Set operator over child criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SetOpKind {
    /// Union of matches.
    Union,
    /// Intersection of matches.
    Intersection,
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOpKind::Union => write!(f, "UNION"),
            SetOpKind::Intersection => write!(f, "INTERSECT"),
        }
    }
}

// =============================================================================
// Values
// =============================================================================

/// A literal compared against a property.
///
/// Decimals compare by their canonical bit pattern: every NaN equals every
/// other NaN and `-0.0` equals `0.0`, so `Value` is a lawful `Eq + Hash` key.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Text value.
    String(String),
    /// Integral value (also used for namespace identifiers).
    Integer(i64),
    /// Decimal value.
    Decimal(f64),
    /// Calendar date.
    Date(NaiveDate),
    /// Boolean value.
    Boolean(bool),
}

fn canonical_bits(n: f64) -> u64 {
    if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(n) => n.hash(state),
            Value::Decimal(n) => canonical_bits(*n).hash(state),
            Value::Date(d) => d.hash(state),
            Value::Boolean(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "'{}'", s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Decimal(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "'{}'", d.format("%Y-%m-%d")),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Decimal(n)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

// =============================================================================
// Junction
// =============================================================================

/// An n-ary conjunction or disjunction under construction.
///
/// Junctions start empty (see [`crate::factory::junction`]) and grow through
/// [`Junction::add`]. Once converted into a [`Criterion`] they are only read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Junction {
    kind: JunctionKind,
    children: Vec<Criterion>,
}

impl Junction {
    /// Creates an empty junction.
    pub fn new(kind: JunctionKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Appends a child criterion.
    pub fn add(&mut self, criterion: Criterion) -> &mut Self {
        self.children.push(criterion);
        self
    }

    /// Appends a child criterion, consuming and returning the junction.
    pub fn with(mut self, criterion: Criterion) -> Self {
        self.children.push(criterion);
        self
    }

    /// The junction operator.
    pub fn kind(&self) -> JunctionKind {
        self.kind
    }

    /// The child criteria, in insertion order.
    pub fn children(&self) -> &[Criterion] {
        &self.children
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if no child has been added.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Collapses the junction: a single child is returned as-is, otherwise
    /// the junction itself becomes the criterion.
    pub fn into_collapsed(mut self) -> Criterion {
        if self.children.len() == 1 {
            if let Some(only) = self.children.pop() {
                return only;
            }
        }
        Criterion::Junction(self)
    }
}

impl From<Junction> for Criterion {
    fn from(junction: Junction) -> Self {
        Criterion::Junction(junction)
    }
}

// =============================================================================
// Criterion
// =============================================================================

/// A node in the logical search criterion tree.
///
/// Property references use dotted `"<alias>.<property>"` paths when the
/// property lives on a joined association, and bare names when it lives on
/// the query's root object.
///
/// # Equality
///
/// Two criteria are equal iff their [`structural_hash`](Self::structural_hash)
/// values are equal. Query caches rely on this as a cheap signal that a deep
/// copy can be skipped. Distinct trees can in principle collide on a 64-bit
/// hash, in which case a consumer would wrongly treat them as identical;
/// callers that cannot tolerate that risk must compare trees field by field.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// Property test without a value (`IS NULL`, `IS EMPTY`, ...).
    NoArg {
        /// Which test.
        kind: NoArgKind,
        /// The tested property.
        property: String,
    },

    /// `property <relation> value`.
    Simple {
        /// Comparison relation.
        relation: Relation,
        /// The compared property.
        property: String,
        /// The literal value.
        value: Value,
        /// Compare text case-insensitively.
        ignore_case: bool,
    },

    /// `property BETWEEN low AND high` (inclusive).
    Between {
        /// The compared property.
        property: String,
        /// Lower bound.
        low: Value,
        /// Upper bound.
        high: Value,
    },

    /// `property LIKE pattern` / `property ILIKE pattern`.
    StringMatch {
        /// Case sensitivity of the match.
        kind: StringMatchKind,
        /// The matched property.
        property: String,
        /// The raw match value, without wildcards.
        value: String,
        /// Where the value must occur.
        match_mode: MatchMode,
        /// Escape character for wildcards inside `value`.
        escape_char: Option<char>,
    },

    /// `property <relation> other_property`.
    PropertyCompare {
        /// Comparison relation.
        relation: Relation,
        /// Left-hand property.
        property: String,
        /// Right-hand property.
        other_property: String,
    },

    /// `size(property) <relation> size`.
    SizeCompare {
        /// Comparison relation.
        relation: Relation,
        /// Collection property.
        property: String,
        /// Size to compare against.
        size: i64,
    },

    /// `property IN (values...)`.
    InSet {
        /// The tested property.
        property: String,
        /// The accepted values.
        values: Vec<Value>,
    },

    /// `property IN (subquery)`.
    InSubquery {
        /// The correlated property.
        property: String,
        /// The sub-query producing the accepted values.
        subquery: Box<SearchQuery>,
    },

    /// `count(subquery) <relation> value`.
    Count {
        /// Comparison relation.
        relation: Relation,
        /// Count to compare against.
        value: i64,
        /// The counted sub-query.
        subquery: Box<SearchQuery>,
    },

    /// Negation.
    Not(Box<Criterion>),

    /// Two-operand AND/OR.
    Binary {
        /// The operator.
        kind: BinaryKind,
        /// Left operand.
        left: Box<Criterion>,
        /// Right operand.
        right: Box<Criterion>,
    },

    /// N-ary conjunction or disjunction.
    Junction(Junction),

    /// N-ary union or intersection.
    SetOp {
        /// The operator.
        kind: SetOpKind,
        /// The operands.
        children: Vec<Criterion>,
    },

    /// Raw backend SQL, passed through untouched.
    SqlRestriction {
        /// The SQL fragment.
        sql: String,
    },
}

impl Criterion {
    /// The tag identifying this criterion's kind.
    pub fn search_type(&self) -> SearchType {
        match self {
            Criterion::NoArg { kind, .. } => match kind {
                NoArgKind::IsNull => SearchType::IsNull,
                NoArgKind::IsNotNull => SearchType::IsNotNull,
                NoArgKind::IsEmpty => SearchType::IsEmpty,
                NoArgKind::IsNotEmpty => SearchType::IsNotEmpty,
            },
            Criterion::Simple { .. } => SearchType::Simple,
            Criterion::Between { .. } => SearchType::Between,
            Criterion::StringMatch { kind, .. } => match kind {
                StringMatchKind::Like => SearchType::Like,
                StringMatchKind::Ilike => SearchType::Ilike,
            },
            Criterion::PropertyCompare { .. } => SearchType::PropertyCompare,
            Criterion::SizeCompare { .. } => SearchType::SizeCompare,
            Criterion::InSet { .. } => SearchType::In,
            Criterion::InSubquery { .. } => SearchType::InSubquery,
            Criterion::Count { .. } => SearchType::Count,
            Criterion::Not(_) => SearchType::Not,
            Criterion::Binary { kind, .. } => match kind {
                BinaryKind::And => SearchType::And,
                BinaryKind::Or => SearchType::Or,
            },
            Criterion::Junction(j) => match j.kind() {
                JunctionKind::Conjunction => SearchType::Conjunction,
                JunctionKind::Disjunction => SearchType::Disjunction,
            },
            Criterion::SetOp { kind, .. } => match kind {
                SetOpKind::Union => SearchType::Union,
                SetOpKind::Intersection => SearchType::Intersection,
            },
            Criterion::SqlRestriction { .. } => SearchType::SqlRestriction,
        }
    }

    /// Returns the direct boolean children of a composite criterion.
    ///
    /// Sub-queries are not children: they carry their own root criterion and
    /// alias scope.
    pub fn children(&self) -> Vec<&Criterion> {
        match self {
            Criterion::Not(inner) => vec![inner.as_ref()],
            Criterion::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Criterion::Junction(j) => j.children().iter().collect(),
            Criterion::SetOp { children, .. } => children.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns true if this is a junction of the given kind.
    pub fn is_junction(&self, kind: JunctionKind) -> bool {
        matches!(self, Criterion::Junction(j) if j.kind() == kind)
    }

    /// Returns the junction if this criterion is one.
    pub fn as_junction(&self) -> Option<&Junction> {
        match self {
            Criterion::Junction(j) => Some(j),
            _ => None,
        }
    }

    /// Collects every property path referenced in this tree, in visit order.
    ///
    /// Sub-query contents are not visited.
    pub fn property_paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.collect_properties(&mut paths);
        paths
    }

    fn collect_properties<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Criterion::NoArg { property, .. }
            | Criterion::Simple { property, .. }
            | Criterion::Between { property, .. }
            | Criterion::StringMatch { property, .. }
            | Criterion::SizeCompare { property, .. }
            | Criterion::InSet { property, .. }
            | Criterion::InSubquery { property, .. } => out.push(property),
            Criterion::PropertyCompare {
                property,
                other_property,
                ..
            } => {
                out.push(property);
                out.push(other_property);
            }
            Criterion::Count { .. } | Criterion::SqlRestriction { .. } => {}
            Criterion::Not(_)
            | Criterion::Binary { .. }
            | Criterion::Junction(_)
            | Criterion::SetOp { .. } => {
                for child in self.children() {
                    child.collect_properties(out);
                }
            }
        }
    }

    /// Structural hash of the whole tree, including nested sub-queries.
    ///
    /// This is the authoritative equality relation for criteria; see the
    /// type-level documentation for the collision caveat.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Hash for Criterion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Criterion::NoArg { kind, property } => {
                kind.hash(state);
                property.hash(state);
            }
            Criterion::Simple {
                relation,
                property,
                value,
                ignore_case,
            } => {
                relation.hash(state);
                property.hash(state);
                value.hash(state);
                ignore_case.hash(state);
            }
            Criterion::Between {
                property,
                low,
                high,
            } => {
                property.hash(state);
                low.hash(state);
                high.hash(state);
            }
            Criterion::StringMatch {
                kind,
                property,
                value,
                match_mode,
                escape_char,
            } => {
                kind.hash(state);
                property.hash(state);
                value.hash(state);
                match_mode.hash(state);
                escape_char.hash(state);
            }
            Criterion::PropertyCompare {
                relation,
                property,
                other_property,
            } => {
                relation.hash(state);
                property.hash(state);
                other_property.hash(state);
            }
            Criterion::SizeCompare {
                relation,
                property,
                size,
            } => {
                relation.hash(state);
                property.hash(state);
                size.hash(state);
            }
            Criterion::InSet { property, values } => {
                property.hash(state);
                values.hash(state);
            }
            Criterion::InSubquery { property, subquery } => {
                property.hash(state);
                subquery.hash(state);
            }
            Criterion::Count {
                relation,
                value,
                subquery,
            } => {
                relation.hash(state);
                value.hash(state);
                subquery.hash(state);
            }
            Criterion::Not(inner) => inner.hash(state),
            Criterion::Binary { kind, left, right } => {
                kind.hash(state);
                left.hash(state);
                right.hash(state);
            }
            Criterion::Junction(j) => j.hash(state),
            Criterion::SetOp { kind, children } => {
                kind.hash(state);
                children.hash(state);
            }
            Criterion::SqlRestriction { sql } => sql.hash(state),
        }
    }
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        self.structural_hash() == other.structural_hash()
    }
}

impl Eq for Criterion {}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::NoArg { kind, property } => write!(f, "{} {}", property, kind),
            Criterion::Simple {
                relation,
                property,
                value,
                ignore_case,
            } => {
                if *ignore_case {
                    write!(f, "lower({}) {} lower({})", property, relation, value)
                } else {
                    write!(f, "{} {} {}", property, relation, value)
                }
            }
            Criterion::Between {
                property,
                low,
                high,
            } => write!(f, "{} BETWEEN {} AND {}", property, low, high),
            Criterion::StringMatch {
                kind,
                property,
                value,
                match_mode,
                escape_char,
            } => {
                write!(
                    f,
                    "{} {} '{}'",
                    property,
                    kind,
                    match_mode.to_pattern(value)
                )?;
                if let Some(c) = escape_char {
                    write!(f, " ESCAPE '{}'", c)?;
                }
                Ok(())
            }
            Criterion::PropertyCompare {
                relation,
                property,
                other_property,
            } => write!(f, "{} {} {}", property, relation, other_property),
            Criterion::SizeCompare {
                relation,
                property,
                size,
            } => write!(f, "size({}) {} {}", property, relation, size),
            Criterion::InSet { property, values } => {
                write!(f, "{} IN (", property)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, ")")
            }
            Criterion::InSubquery { property, subquery } => {
                write!(f, "{} IN ({})", property, subquery)
            }
            Criterion::Count {
                relation,
                value,
                subquery,
            } => write!(f, "count({}) {} {}", subquery, relation, value),
            Criterion::Not(inner) => write!(f, "NOT ({})", inner),
            Criterion::Binary { kind, left, right } => write!(f, "({} {} {})", left, kind, right),
            Criterion::Junction(j) => {
                if j.is_empty() {
                    return match j.kind() {
                        JunctionKind::Conjunction => write!(f, "TRUE"),
                        JunctionKind::Disjunction => write!(f, "FALSE"),
                    };
                }
                write!(f, "(")?;
                for (i, child) in j.children().iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", j.kind().keyword())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Criterion::SetOp { kind, children } => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", kind)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Criterion::SqlRestriction { sql } => write!(f, "{}", sql),
        }
    }
}
