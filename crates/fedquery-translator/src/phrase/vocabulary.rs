//! Coded-vocabulary phrases.
//!
//! A coded concept becomes `AND(namespace, type, codes, modifiers..., value,
//! dates)` over one association alias. When the domain exceeds the `IN`
//! ceiling, each chunk gets its own copy of the shared conjuncts:
//! `OR(AND(ns, type, chunk1, ...), AND(ns, type, chunk2, ...))`.

use fedquery_criteria::{factory, Alias, Criterion, Junction, JunctionKind, Relation, Value};
use tracing::debug;

use super::{PhraseBuilder, PhraseInput};
use crate::error::{TranslatorError, TranslatorResult};
use crate::input::{DateConstraint, ValueConstraint, ValueOperator, ValueType};
use crate::key_type::{AssociationType, KeyType};
use crate::traits::Namespace;

/// SNOMED code marking an observation as a diagnosis.
pub const DIAGNOSIS_TYPE: &str = "439401001";
/// SNOMED code marking an observation as a procedure.
pub const PROCEDURE_TYPE: &str = "71388002";
/// SNOMED code marking an observation as a lab result.
pub const LAB_TYPE: &str = "364712009";
/// SNOMED code marking an observation as a biospecimen.
pub const BIOSPECIMEN_TYPE: &str = "123038009";
/// SNOMED code marking an order as a medication.
pub const MEDICATION_TYPE: &str = "410942007";

/// ICD-O-3 behavior code for in-situ neoplasms.
const IN_SITU_BEHAVIOR: &str = "2";
/// ICD-O-3 behavior code for malignant neoplasms.
const MALIGNANT_BEHAVIOR: &str = "3";

/// Unit text meaning "no unit".
const UNDEFINED_UNIT: &str = "undefined";

/// Vocabulary metadata of a coded key type.
struct CodedConcept {
    namespace: Namespace,
    type_code: &'static str,
    modifier: Option<(&'static str, Namespace)>,
}

fn coded_concept(key_type: KeyType) -> CodedConcept {
    let (namespace, type_code, modifier) = match key_type {
        KeyType::Icd9Diagnosis => (Namespace::Icd9, DIAGNOSIS_TYPE, None),
        KeyType::Icd10Diagnosis => (Namespace::Icd10, DIAGNOSIS_TYPE, None),
        KeyType::Cpt4Procedure => (Namespace::Cpt4, PROCEDURE_TYPE, None),
        KeyType::Icd9Procedure => (Namespace::Icd9, PROCEDURE_TYPE, None),
        KeyType::Loinc => (Namespace::Loinc, LAB_TYPE, None),
        KeyType::Biospecimen => (Namespace::Snomed, BIOSPECIMEN_TYPE, None),
        KeyType::OncologyInSitu => (
            Namespace::IcdO3,
            DIAGNOSIS_TYPE,
            Some((IN_SITU_BEHAVIOR, Namespace::IcdO3)),
        ),
        KeyType::OncologyMalignant => (
            Namespace::IcdO3,
            DIAGNOSIS_TYPE,
            Some((MALIGNANT_BEHAVIOR, Namespace::IcdO3)),
        ),
        _ => (Namespace::Rxnorm, MEDICATION_TYPE, None),
    };
    CodedConcept {
        namespace,
        type_code,
        modifier,
    }
}

/// Property names of a coded association.
struct CodedProperties {
    namespace_id: &'static str,
    type_code: &'static str,
    code: &'static str,
    date: &'static str,
}

const OBSERVATION_PROPERTIES: CodedProperties = CodedProperties {
    namespace_id: "observationNamespaceId",
    type_code: "observationType",
    code: "observation",
    date: "startDateTime",
};

const ORDER_PROPERTIES: CodedProperties = CodedProperties {
    namespace_id: "orderNamespaceId",
    type_code: "orderType",
    code: "orderItem",
    date: "orderDateTime",
};

/// Association joined by a coded key type.
pub(super) fn association_of(key_type: KeyType) -> AssociationType {
    match key_type {
        KeyType::Rxnorm => AssociationType::Order,
        _ => AssociationType::Observation,
    }
}

/// Builds the phrase of a coded key type over `alias`.
pub(super) fn coded_phrase(
    builder: &PhraseBuilder<'_>,
    input: &PhraseInput<'_>,
    alias: &Alias,
) -> TranslatorResult<Criterion> {
    let concept = coded_concept(input.key_type);
    let properties = match association_of(input.key_type) {
        AssociationType::Order => &ORDER_PROPERTIES,
        _ => &OBSERVATION_PROPERTIES,
    };

    // Conjuncts shared by every chunk, before and after the code predicate.
    let head = vec![
        eq(
            alias.qualify(properties.namespace_id),
            builder.namespace_id(concept.namespace),
        ),
        eq(alias.qualify(properties.type_code), concept.type_code),
    ];
    let mut tail = Vec::new();
    if let Some((modifier_code, modifier_namespace)) = concept.modifier {
        tail.push(eq(alias.qualify("modifierCode"), modifier_code));
        tail.push(eq(
            alias.qualify("modifierNamespaceId"),
            builder.namespace_id(modifier_namespace),
        ));
    }
    if let Some(value) = input.value_constraint {
        if input.key_type == KeyType::Loinc {
            tail.push(lab_value(builder, alias, value)?);
        } else {
            debug!(key_type = %input.key_type, "ignoring value constraint on non-lab item");
        }
    }
    if let Some(dates) = input.date_constraint {
        if let Some(window) = date_window(&alias.qualify(properties.date), dates) {
            tail.push(window);
        }
    }

    let code_property = alias.qualify(properties.code);
    let values: Vec<Value> = input.domain.iter().map(Value::from).collect();
    let max_in = builder.max_in();

    if max_in == 0 || values.len() <= max_in {
        let codes = factory::collection_in(code_property, values, max_in)?;
        return Ok(conjoin(&head, codes, &tail));
    }

    debug!(
        key_type = %input.key_type,
        codes = values.len(),
        max_in,
        "splitting code domain into chunks"
    );
    let mut any = Junction::new(JunctionKind::Disjunction);
    for chunk in values.chunks(max_in) {
        let codes = factory::collection_in(code_property.clone(), chunk.to_vec(), max_in)?;
        any.add(conjoin(&head, codes, &tail));
    }
    Ok(any.into())
}

fn conjoin(head: &[Criterion], codes: Criterion, tail: &[Criterion]) -> Criterion {
    let mut all = Junction::new(JunctionKind::Conjunction);
    for criterion in head {
        all.add(criterion.clone());
    }
    all.add(codes);
    for criterion in tail {
        all.add(criterion.clone());
    }
    all.into()
}

fn eq(property: String, value: impl Into<Value>) -> Criterion {
    factory::simple_expression(Relation::Eq, property, value)
}

// =============================================================================
// Lab values
// =============================================================================

fn lab_value(
    builder: &PhraseBuilder<'_>,
    alias: &Alias,
    constraint: &ValueConstraint,
) -> TranslatorResult<Criterion> {
    let mut all = Junction::new(JunctionKind::Conjunction);
    match constraint.value_type {
        ValueType::Number => {
            all.add(number_predicate(&alias.qualify("valueNumber"), constraint)?);
            all.add(eq(alias.qualify("valueType"), "Number"));
            if let Some(unit) = defined_unit(constraint) {
                all.add(eq(
                    alias.qualify("valueUnitsNamespaceId"),
                    builder.namespace_id(Namespace::Ucum),
                ));
                all.add(eq(alias.qualify("valueUnits"), unit));
            }
        }
        ValueType::Flag => {
            all.add(eq(
                alias.qualify("valueFlag"),
                flag_code(&constraint.value)?,
            ));
            all.add(eq(
                alias.qualify("valueFlagNamespaceId"),
                builder.namespace_id(Namespace::Snomed),
            ));
        }
    }
    Ok(all.into())
}

fn defined_unit(constraint: &ValueConstraint) -> Option<&str> {
    constraint
        .unit_of_measure
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty() && !u.eq_ignore_ascii_case(UNDEFINED_UNIT))
}

fn number_predicate(property: &str, constraint: &ValueConstraint) -> TranslatorResult<Criterion> {
    let relation = match constraint.operator {
        ValueOperator::Eq => Relation::Eq,
        ValueOperator::Ne => Relation::Ne,
        ValueOperator::Lt => Relation::Lt,
        ValueOperator::Le => Relation::Le,
        ValueOperator::Gt => Relation::Gt,
        ValueOperator::Ge => Relation::Ge,
        ValueOperator::Between => {
            let (low, high) = split_between(&constraint.value)?;
            return Ok(factory::range(
                property,
                parse_number(&constraint.value, low)?,
                parse_number(&constraint.value, high)?,
            ));
        }
    };
    let value = parse_number(&constraint.value, &constraint.value)?;
    Ok(factory::simple_expression(relation, property, value))
}

fn split_between(value: &str) -> TranslatorResult<(&str, &str)> {
    let lower = value.to_ascii_lowercase();
    match lower.find(" and ") {
        Some(at) => Ok((&value[..at], &value[at + 5..])),
        None => Err(TranslatorError::InvalidValueConstraint {
            value: value.to_string(),
            reason: "expected '<low> and <high>'".to_string(),
        }),
    }
}

fn parse_number(value: &str, token: &str) -> TranslatorResult<f64> {
    token
        .trim()
        .parse::<f64>()
        .map_err(|_| TranslatorError::InvalidValueConstraint {
            value: value.to_string(),
            reason: format!("'{}' is not a number", token.trim()),
        })
}

/// Maps an abnormality flag letter to its SNOMED code.
pub fn flag_code(flag: &str) -> TranslatorResult<&'static str> {
    match flag.trim().to_ascii_uppercase().as_str() {
        "H" => Ok("371879000"),
        "L" => Ok("371880002"),
        "N" => Ok("17621005"),
        "A" => Ok("263654008"),
        _ => Err(TranslatorError::UnsupportedValueFlag {
            flag: flag.to_string(),
        }),
    }
}

// =============================================================================
// Dates
// =============================================================================

fn date_window(property: &str, dates: &DateConstraint) -> Option<Criterion> {
    match (dates.from, dates.to) {
        (Some(from), Some(to)) => Some(factory::range(property, from, to)),
        (Some(from), None) => Some(factory::simple_expression(Relation::Ge, property, from)),
        (None, Some(to)) => Some(factory::simple_expression(Relation::Le, property, to)),
        (None, None) => None,
    }
}
