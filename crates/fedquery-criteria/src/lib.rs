//! # fedquery-criteria
//!
//! Backend-agnostic logical search criteria for federated cohort queries.
//!
//! This crate provides:
//! - **Criterion tree**: a closed set of leaf and composite criteria over
//!   dotted `"<alias>.<property>"` paths
//! - **Factory**: arity- and kind-checked constructors, including `IN`-list
//!   partitioning for backends with a bind-parameter ceiling
//! - **Search query**: a read-only container for the root criterion, join
//!   aliases, sort order and pagination
//!
//! ## Usage
//!
//! ```rust
//! use fedquery_criteria::{factory, Alias, Relation, SearchQuery, SearchType};
//!
//! let obs = Alias::new("Observation", "obs1", "observations");
//! let mut all = factory::junction(SearchType::Conjunction).unwrap();
//! all.add(factory::simple_expression(Relation::Eq, obs.qualify("observation"), "2345-7"))
//!     .add(factory::simple_expression(Relation::Ge, "age", 60));
//!
//! let query = SearchQuery::builder("Person", all.into())
//!     .alias(obs)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(
//!     query.to_string(),
//!     "FROM Person JOIN observations AS obs1 (Observation) \
//!      WHERE (obs1.observation = '2345-7' AND age >= 60)"
//! );
//! ```
//!
//! ## Criterion Kinds
//!
//! | Kind | Meaning | Example |
//! |------|---------|---------|
//! | `SIMPLE` | property vs. literal | `age >= 60` |
//! | `BETWEEN` | inclusive range | `age BETWEEN 45 AND 50` |
//! | `IN` | value list | `race IN ('A', 'B')` |
//! | `IN_SUBQUERY` | correlated sub-query | `id IN (FROM Person ...)` |
//! | `NOT` | negation | `NOT (gender = 'F')` |
//! | `CONJUNCTION` | n-ary AND | `(a AND b AND c)` |
//! | `DISJUNCTION` | n-ary OR | `(a OR b)` |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod criterion;
mod error;
pub mod factory;
mod query;
mod search_type;

pub use criterion::{
    BinaryKind, Criterion, Junction, JunctionKind, MatchMode, NoArgKind, Relation, SetOpKind,
    StringMatchKind, Value,
};
pub use error::{CriteriaError, CriteriaResult};
pub use factory::DEFAULT_MAX_IN;
pub use query::{Alias, QueryId, SearchQuery, SearchQueryBuilder, SortCriterion, SortDirection};
pub use search_type::{Arity, SearchType};
