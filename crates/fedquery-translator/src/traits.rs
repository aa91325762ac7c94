//! Collaborator traits for query translation.
//!
//! The translator does not look up vocabularies itself. Concept expansion and
//! namespace resolution are supplied by the caller through the
//! [`DomainExpansion`] and [`NamespaceRegistry`] traits.
//!
//! # Example: Implementing the collaborators over in-memory maps
//!
//! ```rust
//! use std::collections::HashMap;
//! use fedquery_translator::{DomainExpansion, Namespace, NamespaceRegistry};
//!
//! struct Ontology {
//!     codes: HashMap<String, Vec<String>>,
//! }
//!
//! impl DomainExpansion for Ontology {
//!     fn find_domain(&self, item_key: &str) -> Vec<String> {
//!         self.codes.get(item_key).cloned().unwrap_or_default()
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
//! ```

use std::fmt;

/// Logical vocabulary identifiers resolved by a [`NamespaceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Namespace {
    /// SNOMED CT.
    Snomed,
    /// ICD-9-CM.
    Icd9,
    /// ICD-10-CM.
    Icd10,
    /// CPT-4.
    Cpt4,
    /// LOINC.
    Loinc,
    /// RxNorm.
    Rxnorm,
    /// ICD-O-3 (oncology morphology and behavior).
    IcdO3,
    /// UCUM units of measure.
    Ucum,
    /// FIPS state and county codes.
    Fips,
    /// Health district groupings.
    HealthDistrict,
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Namespace::Snomed => "SNOMED",
            Namespace::Icd9 => "ICD9",
            Namespace::Icd10 => "ICD10",
            Namespace::Cpt4 => "CPT4",
            Namespace::Loinc => "LOINC",
            Namespace::Rxnorm => "RXNORM",
            Namespace::IcdO3 => "ICDO3",
            Namespace::Ucum => "UCUM",
            Namespace::Fips => "FIPS",
            Namespace::HealthDistrict => "HEALTH_DISTRICT",
        };
        write!(f, "{}", name)
    }
}

/// Expands an item key into the concept codes it covers.
///
/// Implement this for your terminology service in your application crate.
pub trait DomainExpansion {
    /// Returns the code of every concept matching `item_key`.
    ///
    /// `item_key` is the cleaned, wildcard-suffixed key produced by
    /// [`ItemKey::domain_pattern`](crate::ItemKey::domain_pattern).
    /// Compound `"<vocabulary>:<code>"` entries must be reduced to the bare
    /// `<code>`. Returns an empty vector when nothing matches.
    fn find_domain(&self, item_key: &str) -> Vec<String>;
}

/// Resolves logical vocabularies to backend identifiers.
pub trait NamespaceRegistry {
    /// Backend numeric id used in namespace equality predicates.
    fn namespace_id(&self, namespace: Namespace) -> i64;

    /// Backend display name of the namespace.
    fn namespace_name(&self, namespace: Namespace) -> String;
}

/// Strips a `"<vocabulary>:"` prefix from a concept code, if present.
///
/// Helper for [`DomainExpansion`] implementations.
pub fn bare_code(code: &str) -> &str {
    match code.rsplit_once(':') {
        Some((_, bare)) => bare,
        None => code,
    }
}
