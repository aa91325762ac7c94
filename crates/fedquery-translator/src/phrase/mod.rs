//! Per-key-type criterion construction.
//!
//! A phrase is the criterion contributed by one item (or by the merged items
//! of one grouped key type) within a group. [`PhraseBuilder::build`]
//! dispatches on the [`KeyType`]:
//!
//! - coded vocabularies (diagnoses, procedures, labs, biospecimens, oncology,
//!   medications) get the namespace/type/code conjunction of
//!   [`vocabulary`], split into per-chunk conjunctions for large domains;
//! - demographics and encounter fields get one of the fixed strategies of
//!   [`demographic`];
//! - [`KeyType::Unknown`] contributes nothing.

mod demographic;
mod vocabulary;

use fedquery_criteria::{factory, Criterion, Value};

use crate::alias::GroupAliases;
use crate::error::{TranslatorError, TranslatorResult};
use crate::input::{DateConstraint, QueryItem, ValueConstraint};
use crate::key_type::{AssociationType, KeyType};
use crate::traits::{Namespace, NamespaceRegistry};

pub use demographic::LocationLevel;

/// Everything needed to build one phrase.
#[derive(Debug, Clone, Copy)]
pub struct PhraseInput<'a> {
    /// Classification of the item(s).
    pub key_type: KeyType,
    /// Raw key of the (first) contributing item, for error reporting.
    pub item_key: &'a str,
    /// Expanded concept codes.
    pub domain: &'a [String],
    /// Value constraint of the item, if any.
    pub value_constraint: Option<&'a ValueConstraint>,
    /// Date constraint of the item, if any.
    pub date_constraint: Option<&'a DateConstraint>,
}

impl<'a> PhraseInput<'a> {
    /// Input for a single item with its constraints.
    pub fn for_item(key_type: KeyType, item: &'a QueryItem, domain: &'a [String]) -> Self {
        Self {
            key_type,
            item_key: &item.item_key,
            domain,
            value_constraint: item.value_constraint.as_ref(),
            date_constraint: item.date_constraint.as_ref(),
        }
    }

    /// Input for the merged domain of a grouped key type. Item constraints
    /// do not apply to merged domains.
    pub fn merged(key_type: KeyType, item_key: &'a str, domain: &'a [String]) -> Self {
        Self {
            key_type,
            item_key,
            domain,
            value_constraint: None,
            date_constraint: None,
        }
    }
}

/// Builds phrases against a namespace registry and an `IN` ceiling.
pub struct PhraseBuilder<'a> {
    namespaces: &'a dyn NamespaceRegistry,
    max_in: usize,
}

impl<'a> PhraseBuilder<'a> {
    /// Creates a builder.
    pub fn new(namespaces: &'a dyn NamespaceRegistry, max_in: usize) -> Self {
        Self { namespaces, max_in }
    }

    /// The `IN` ceiling used for code membership.
    pub fn max_in(&self) -> usize {
        self.max_in
    }

    /// Builds the phrase for `input`.
    ///
    /// Returns `Ok(None)` when the item contributes nothing: an unknown key
    /// type, or a demographic whose domain is empty. An empty domain for any
    /// other key type is [`TranslatorError::EmptyDomain`].
    ///
    /// # Panics
    ///
    /// Panics if `aliases` lacks the alias of the key type's association.
    pub fn build(
        &self,
        input: &PhraseInput<'_>,
        aliases: &GroupAliases,
    ) -> TranslatorResult<Option<Criterion>> {
        let key_type = input.key_type;
        if key_type == KeyType::Unknown {
            return Ok(None);
        }
        if input.domain.is_empty() {
            if key_type.is_demographic() {
                return Ok(None);
            }
            return Err(TranslatorError::EmptyDomain {
                key_type,
                item_key: input.item_key.to_string(),
            });
        }

        match key_type {
            KeyType::Icd9Diagnosis
            | KeyType::Icd10Diagnosis
            | KeyType::Cpt4Procedure
            | KeyType::Icd9Procedure
            | KeyType::Loinc
            | KeyType::Biospecimen
            | KeyType::OncologyMalignant
            | KeyType::OncologyInSitu
            | KeyType::Rxnorm => {
                let association = vocabulary::association_of(key_type);
                vocabulary::coded_phrase(self, input, aliases.get(association)).map(Some)
            }
            KeyType::Gender
            | KeyType::Language
            | KeyType::MaritalStatus
            | KeyType::Race
            | KeyType::Religion
            | KeyType::VitalStatus
            | KeyType::Ethnicity
            | KeyType::PedigreeQuality => {
                let property = demographic::root_property(key_type);
                self.code_membership(property, input.domain).map(Some)
            }
            KeyType::Age => demographic::greater_than_or_range(
                key_type,
                demographic::root_property(key_type),
                input.domain,
            ),
            KeyType::BirthYear => demographic::integer_range(
                key_type,
                demographic::root_property(key_type),
                input.domain,
            ),
            KeyType::BirthDate => demographic::date_range(
                key_type,
                demographic::root_property(key_type),
                input.domain,
            ),
            KeyType::State | KeyType::HealthDistrictGroup | KeyType::County => {
                demographic::location(
                    self,
                    key_type,
                    aliases.get(AssociationType::Location),
                    input.domain,
                )
            }
            KeyType::EncounterLengthOfStay => {
                let enc = aliases.get(AssociationType::Encounter);
                demographic::greater_than_or_range(
                    key_type,
                    &enc.qualify("lengthOfStay"),
                    input.domain,
                )
            }
            KeyType::EncounterType => {
                let enc = aliases.get(AssociationType::Encounter);
                self.code_membership(&enc.qualify("encounterType"), input.domain)
                    .map(Some)
            }
            KeyType::Unknown => Ok(None),
        }
    }

    fn code_membership(&self, property: &str, domain: &[String]) -> TranslatorResult<Criterion> {
        let values: Vec<Value> = domain.iter().map(Value::from).collect();
        factory::collection_in(property, values, self.max_in).map_err(TranslatorError::from)
    }

    fn namespace_id(&self, namespace: Namespace) -> Value {
        Value::Integer(self.namespaces.namespace_id(namespace))
    }
}
