//! Demographic and encounter-field phrases.

use chrono::NaiveDate;
use fedquery_criteria::{factory, Alias, Criterion, Junction, JunctionKind, Relation, Value};
use tracing::debug;

use super::PhraseBuilder;
use crate::error::{TranslatorError, TranslatorResult};
use crate::key_type::KeyType;
use crate::traits::Namespace;

/// Person location type used for residence criteria.
const RESIDENCE: &str = "Residence";

/// Root-object property of a demographic key type.
pub(super) fn root_property(key_type: KeyType) -> &'static str {
    match key_type {
        KeyType::Gender => "administrativeGender",
        KeyType::Language => "primaryLanguage",
        KeyType::MaritalStatus => "maritalStatus",
        KeyType::Race => "race",
        KeyType::Religion => "religion",
        KeyType::VitalStatus => "vitalStatus",
        KeyType::Ethnicity => "ethnicity",
        KeyType::PedigreeQuality => "pedigreeQuality",
        KeyType::Age => "age",
        KeyType::BirthYear => "birthYear",
        KeyType::BirthDate => "dateOfBirth",
        other => unreachable!("{} is not a root demographic", other),
    }
}

// =============================================================================
// Numeric ranges
// =============================================================================

/// Age and length-of-stay strategy.
///
/// A token containing `>` (as in `">60"` or `">= 60"`) wins outright: every
/// other token is discarded and the result is `property >= n`. Otherwise all
/// tokens are integers and the result is `property BETWEEN min AND max`.
///
/// The bound must be a whole number, optionally followed by a unit word
/// (`"> 10 days"`); `">60.5"` is rejected rather than truncated.
pub(super) fn greater_than_or_range(
    key_type: KeyType,
    property: &str,
    domain: &[String],
) -> TranslatorResult<Option<Criterion>> {
    if let Some(token) = domain.iter().find(|t| t.contains('>')) {
        let bound = open_bound(key_type, token)?;
        return Ok(Some(factory::simple_expression(Relation::Ge, property, bound)));
    }
    integer_range(key_type, property, domain)
}

/// Birth-year strategy: `property BETWEEN min AND max` over integer tokens.
pub(super) fn integer_range(
    key_type: KeyType,
    property: &str,
    domain: &[String],
) -> TranslatorResult<Option<Criterion>> {
    let numbers = domain
        .iter()
        .map(|token| parse_integer(key_type, token))
        .collect::<TranslatorResult<Vec<i64>>>()?;
    Ok(bounds(&numbers).map(|(low, high)| factory::range(property, low, high)))
}

/// Birth-date strategy: `property BETWEEN min AND max` over date tokens.
pub(super) fn date_range(
    key_type: KeyType,
    property: &str,
    domain: &[String],
) -> TranslatorResult<Option<Criterion>> {
    let dates = domain
        .iter()
        .map(|token| parse_date(key_type, token))
        .collect::<TranslatorResult<Vec<NaiveDate>>>()?;
    Ok(bounds(&dates).map(|(low, high)| factory::range(property, low, high)))
}

fn bounds<T: Ord + Copy>(values: &[T]) -> Option<(T, T)> {
    let low = values.iter().min()?;
    let high = values.iter().max()?;
    Some((*low, *high))
}

fn open_bound(key_type: KeyType, token: &str) -> TranslatorResult<i64> {
    let malformed = || invalid_token(key_type, token, "expected '>' or '>=' and an integer");
    let after = token.split_once('>').map(|(_, rest)| rest).unwrap_or_default();
    let after = after.trim_start_matches('=').trim_start();
    let digits_end = after
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after.len());
    let (digits, unit) = after.split_at(digits_end);
    if !unit.chars().all(|c| c.is_ascii_alphabetic() || c.is_whitespace()) {
        return Err(malformed());
    }
    digits.parse::<i64>().map_err(|_| malformed())
}

fn parse_integer(key_type: KeyType, token: &str) -> TranslatorResult<i64> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid_token(key_type, token, "not an integer"))
}

fn parse_date(key_type: KeyType, token: &str) -> TranslatorResult<NaiveDate> {
    let token = token.trim();
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(token, "%m/%d/%Y"))
        .map_err(|_| invalid_token(key_type, token, "expected YYYY-MM-DD or MM/DD/YYYY"))
}

fn invalid_token(key_type: KeyType, token: &str, reason: &str) -> TranslatorError {
    TranslatorError::InvalidDomainToken {
        key_type,
        token: token.to_string(),
        reason: reason.to_string(),
    }
}

// =============================================================================
// Locations
// =============================================================================

/// Administrative level of a location token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocationLevel {
    /// `ST|<code>`
    State,
    /// `HDG|<code>`
    HealthDistrictGroup,
    /// `CNTY|<code>`
    County,
}

impl LocationLevel {
    /// Looks up the level named by a token prefix.
    pub fn from_prefix(prefix: &str) -> Option<LocationLevel> {
        match prefix {
            "ST" => Some(LocationLevel::State),
            "HDG" => Some(LocationLevel::HealthDistrictGroup),
            "CNTY" => Some(LocationLevel::County),
            _ => None,
        }
    }

    /// Value of the `locationType` property.
    pub fn type_name(&self) -> &'static str {
        match self {
            LocationLevel::State => "STATE",
            LocationLevel::HealthDistrictGroup => "HEALTH_DISTRICT_GROUP",
            LocationLevel::County => "COUNTY",
        }
    }

    /// Vocabulary of the level's codes.
    pub fn namespace(&self) -> Namespace {
        match self {
            LocationLevel::State | LocationLevel::County => Namespace::Fips,
            LocationLevel::HealthDistrictGroup => Namespace::HealthDistrict,
        }
    }
}

/// Location strategy.
///
/// Uses only the first domain token, `"<prefix>|<code>"`. Descendant codes
/// are not unioned in.
pub(super) fn location(
    builder: &PhraseBuilder<'_>,
    key_type: KeyType,
    alias: &Alias,
    domain: &[String],
) -> TranslatorResult<Option<Criterion>> {
    let Some(token) = domain.first() else {
        return Ok(None);
    };
    if domain.len() > 1 {
        debug!(
            key_type = %key_type,
            ignored = domain.len() - 1,
            "ignoring extra location tokens"
        );
    }

    let (prefix, code) = token
        .split_once('|')
        .ok_or_else(|| invalid_token(key_type, token, "expected '<prefix>|<code>'"))?;
    let level = LocationLevel::from_prefix(prefix.trim())
        .ok_or_else(|| invalid_token(key_type, token, "unknown location prefix"))?;

    let mut all = Junction::new(JunctionKind::Conjunction);
    all.add(eq(
        alias.qualify("locationNamespaceId"),
        builder.namespace_id(level.namespace()),
    ))
    .add(eq(alias.qualify("locationType"), level.type_name()))
    .add(eq(alias.qualify("personLocationType"), RESIDENCE))
    .add(eq(alias.qualify("locationCode"), code.trim()));
    Ok(Some(all.into()))
}

fn eq(property: String, value: impl Into<Value>) -> Criterion {
    factory::simple_expression(Relation::Eq, property, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn domain(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    fn age(tokens: &[&str]) -> TranslatorResult<Option<Criterion>> {
        greater_than_or_range(KeyType::Age, "age", &domain(tokens))
    }

    #[test]
    fn test_greater_than_token_wins() {
        let criterion = age(&["45", ">60", "50"]).unwrap().unwrap();
        assert_eq!(
            criterion,
            factory::simple_expression(Relation::Ge, "age", 60)
        );
    }

    #[test]
    fn test_greater_or_equal_token() {
        let criterion = age(&[">= 85"]).unwrap().unwrap();
        assert_eq!(
            criterion,
            factory::simple_expression(Relation::Ge, "age", 85)
        );
    }

    #[test]
    fn test_open_bound_allows_unit_word() {
        let criterion = age(&["> 10 days"]).unwrap().unwrap();
        assert_eq!(
            criterion,
            factory::simple_expression(Relation::Ge, "age", 10)
        );
    }

    #[test]
    fn test_fractional_open_bound_is_rejected() {
        let err = age(&[">60.5"]).unwrap_err();
        assert!(matches!(
            err,
            TranslatorError::InvalidDomainToken { ref token, .. } if token == ">60.5"
        ));
        assert!(age(&[">60+"]).is_err());
    }

    #[test]
    fn test_plain_tokens_make_range() {
        let criterion = age(&["45", "50", "60"]).unwrap().unwrap();
        assert_eq!(criterion, factory::range("age", 45, 60));
    }

    #[test]
    fn test_range_is_order_independent() {
        let tokens = domain(&["1990", "1970"]);
        let criterion = integer_range(KeyType::BirthYear, "birthYear", &tokens)
            .unwrap()
            .unwrap();
        assert_eq!(criterion, factory::range("birthYear", 1970, 1990));
    }

    #[test]
    fn test_non_integer_token_is_rejected() {
        let err = integer_range(KeyType::Age, "age", &domain(&["45", "old"])).unwrap_err();
        assert_eq!(
            err,
            TranslatorError::InvalidDomainToken {
                key_type: KeyType::Age,
                token: "old".to_string(),
                reason: "not an integer".to_string(),
            }
        );
    }

    #[test]
    fn test_malformed_open_bound_is_rejected() {
        assert!(age(&[">x"]).is_err());
    }

    #[test]
    fn test_birth_date_formats() {
        let tokens = domain(&["1980-05-01", "12/31/1979"]);
        let criterion = date_range(KeyType::BirthDate, "dateOfBirth", &tokens)
            .unwrap()
            .unwrap();
        assert_eq!(
            criterion,
            factory::range(
                "dateOfBirth",
                NaiveDate::from_ymd_opt(1979, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(1980, 5, 1).unwrap(),
            )
        );
    }

    #[test]
    fn test_location_prefixes() {
        assert_eq!(LocationLevel::from_prefix("ST"), Some(LocationLevel::State));
        assert_eq!(
            LocationLevel::from_prefix("HDG"),
            Some(LocationLevel::HealthDistrictGroup)
        );
        assert_eq!(
            LocationLevel::from_prefix("CNTY"),
            Some(LocationLevel::County)
        );
        assert_eq!(LocationLevel::from_prefix("ZIP"), None);
    }

    #[test]
    fn test_root_properties() {
        assert_eq!(root_property(KeyType::Gender), "administrativeGender");
        assert_eq!(root_property(KeyType::BirthDate), "dateOfBirth");
    }
}
