//! Shared collaborators for translator integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use fedquery_translator::{DomainExpansion, Namespace, NamespaceRegistry, QueryGroup, QueryItem};

/// In-memory domain expansion keyed by wildcard pattern.
#[derive(Default)]
pub struct TestOntology {
    domains: HashMap<String, Vec<String>>,
}

impl TestOntology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the codes returned for `pattern` (`\seg\seg\%`).
    pub fn with(mut self, pattern: &str, codes: &[&str]) -> Self {
        self.domains.insert(
            pattern.to_string(),
            codes.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Registers `count` generated codes for `pattern`.
    pub fn with_generated(mut self, pattern: &str, count: usize) -> Self {
        let codes = (0..count).map(|i| format!("C{:05}", i)).collect();
        self.domains.insert(pattern.to_string(), codes);
        self
    }
}

impl DomainExpansion for TestOntology {
    fn find_domain(&self, item_key: &str) -> Vec<String> {
        self.domains.get(item_key).cloned().unwrap_or_default()
    }
}

/// Registry assigning each namespace its declaration index plus one.
pub struct TestRegistry;

impl NamespaceRegistry for TestRegistry {
    fn namespace_id(&self, namespace: Namespace) -> i64 {
        namespace as i64 + 1
    }

    fn namespace_name(&self, namespace: Namespace) -> String {
        namespace.to_string()
    }
}

pub const LOINC_KEY: &str = "\\\\i2b2\\Labs\\LOINC\\2345-7\\";
pub const LOINC_PATTERN: &str = "\\Labs\\LOINC\\2345-7\\%";
pub const ICD9_KEY: &str = "\\\\i2b2\\Diagnoses\\ICD9\\250\\";
pub const ICD9_PATTERN: &str = "\\Diagnoses\\ICD9\\250\\%";
pub const ICD10_KEY: &str = "\\\\i2b2\\Diagnoses\\ICD10\\E11\\";
pub const ICD10_PATTERN: &str = "\\Diagnoses\\ICD10\\E11\\%";
pub const RXNORM_KEY: &str = "\\\\i2b2\\Medications\\RXNORM\\6809\\";
pub const RXNORM_PATTERN: &str = "\\Medications\\RXNORM\\6809\\%";
pub const GENDER_KEY: &str = "\\\\i2b2\\Demographics\\Gender\\";
pub const GENDER_PATTERN: &str = "\\Demographics\\Gender\\%";
pub const STATE_KEY: &str = "\\\\i2b2\\Demographics\\Location\\State\\TX\\";
pub const STATE_PATTERN: &str = "\\Demographics\\Location\\State\\TX\\%";
pub const ONCOLOGY_KEY: &str = "\\\\i2b2\\Oncology\\8010\\";
pub const ONCOLOGY_PATTERN: &str = "\\Oncology\\8010\\%";
pub const BIRTH_YEAR_KEY: &str = "\\\\i2b2\\Demographics\\Birth Year\\";
pub const BIRTH_YEAR_PATTERN: &str = "\\Demographics\\Birth Year\\%";
pub const BIRTH_DATE_KEY: &str = "\\\\i2b2\\Demographics\\Birth Date\\";
pub const BIRTH_DATE_PATTERN: &str = "\\Demographics\\Birth Date\\%";
pub const STAY_KEY: &str = "\\\\i2b2\\Encounters\\Length of Stay\\> 10 days\\";
pub const STAY_PATTERN: &str = "\\Encounters\\Length of Stay\\> 10 days\\%";
pub const ENCOUNTER_TYPE_KEY: &str = "\\\\i2b2\\Encounters\\Type\\Inpatient\\";
pub const ENCOUNTER_TYPE_PATTERN: &str = "\\Encounters\\Type\\Inpatient\\%";

pub const LOINC_ID: i64 = 5;
pub const ICD9_ID: i64 = 2;
pub const RXNORM_ID: i64 = 6;
pub const SNOMED_ID: i64 = 1;
pub const UCUM_ID: i64 = 8;
pub const FIPS_ID: i64 = 9;
pub const ICDO3_ID: i64 = 7;

/// The ontology used by most tests.
pub fn ontology() -> TestOntology {
    TestOntology::new()
        .with(LOINC_PATTERN, &["2345-7"])
        .with(ICD9_PATTERN, &["250.00", "250.01"])
        .with(ICD10_PATTERN, &["E11.9"])
        .with(RXNORM_PATTERN, &["RXNORM:6809"])
        .with(GENDER_PATTERN, &["F"])
        .with(STATE_PATTERN, &["ST|48"])
}

/// A non-inverted group of items with the given keys.
pub fn group(keys: &[&str]) -> QueryGroup {
    QueryGroup::new(keys.iter().map(|k| QueryItem::new(*k)).collect())
}
