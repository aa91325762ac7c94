//! # fedquery-translator
//!
//! Translates i2b2-style cohort requests into backend-agnostic
//! [`fedquery_criteria::SearchQuery`] trees.
//!
//! A request is a list of [`QueryGroup`]s. Groups are ANDed; the items of a
//! group are ORed. Each item is classified into a [`KeyType`] from its
//! hierarchical item key, expanded into concept codes by a
//! [`DomainExpansion`] collaborator, and turned into a criterion over the
//! root object or a joined association.
//!
//! ## Quick Start
//!
//! ```rust
//! use fedquery_translator::{
//!     DomainExpansion, Namespace, NamespaceRegistry, QueryGroup, QueryItem, QueryTranslator,
//! };
//!
//! struct Labs;
//!
//! impl DomainExpansion for Labs {
//!     fn find_domain(&self, item_key: &str) -> Vec<String> {
//!         match item_key {
//!             "\\Labs\\LOINC\\2345-7\\%" => vec!["LOINC:2345-7".to_string()],
//!             _ => Vec::new(),
//!         }
//!     }
//! }
//!
//! struct Registry;
//!
//! impl NamespaceRegistry for Registry {
//!     fn namespace_id(&self, namespace: Namespace) -> i64 {
//!         namespace as i64
//!     }
//!
//!     fn namespace_name(&self, namespace: Namespace) -> String {
//!         namespace.to_string()
//!     }
//! }
//!
//! let translator = QueryTranslator::new(&Labs, &Registry);
//! let group = QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Labs\\LOINC\\2345-7\\")]);
//! let translation = translator.translate(&[group]).unwrap();
//!
//! assert_eq!(
//!     translation.query.to_string(),
//!     "FROM Person JOIN observations AS obs1 (Observation) \
//!      WHERE (obs1.observationNamespaceId = 4 AND obs1.observationType = '364712009' \
//!      AND obs1.observation = '2345-7')"
//! );
//! ```
//!
//! ## Conflicting Groups
//!
//! Observation-backed key types conflict with each other. When a later group
//! uses one after an earlier group already did, the later group gets a fresh
//! observation alias and is wrapped in a correlated sub-query
//! (`id IN (FROM Person ...)`) so the two groups need not match the same
//! observation row.
//!
//! ## Key Types
//!
//! | Family | Key types | Criterion |
//! |--------|-----------|-----------|
//! | Coded | ICD9/ICD10 diagnoses, CPT4/ICD9 procedures, LOINC, biospecimens, oncology, RXNORM | namespace, type and code membership on an association |
//! | Categorical | gender, language, marital status, race, religion, vital status, ethnicity, pedigree quality | `IN` on a root property |
//! | Numeric | age, birth year, birth date, length of stay | `>=` or `BETWEEN` |
//! | Location | state, health district group, county | residence location match |
//!
//! ## Feature Flags
//!
//! - `serde` - Serialization support for inputs and criteria

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod alias;
mod cache;
mod config;
mod error;
mod input;
mod item_key;
mod key_type;
mod phrase;
mod result;
mod traits;
mod translator;

// Public re-exports
pub use alias::{AliasAllocator, GroupAliases};
pub use cache::{CacheStats, TranslationCache};
pub use config::{
    CacheConfig, TranslatorConfig, TranslatorConfigBuilder, DEFAULT_CORRELATION_PROPERTY,
    DEFAULT_ROOT_OBJECT_NAME,
};
pub use error::{TranslatorError, TranslatorResult};
pub use input::{DateConstraint, QueryGroup, QueryItem, ValueConstraint, ValueOperator, ValueType};
pub use item_key::{parse_item_key, ItemKey};
pub use key_type::{
    AssociationType, KeyType, ToolTipOverride, CLASSIFICATION_RULES, TOOL_TIP_OVERRIDES,
};
pub use phrase::{LocationLevel, PhraseBuilder, PhraseInput};
pub use result::{SkipReason, SkippedItem, Translation, TranslationRequest, TranslationStats};
pub use traits::{bare_code, DomainExpansion, Namespace, NamespaceRegistry};
pub use translator::QueryTranslator;
