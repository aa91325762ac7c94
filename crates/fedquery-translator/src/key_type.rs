//! Concept key-type taxonomy.
//!
//! Every query item is classified into a [`KeyType`] by matching its parsed
//! [`ItemKey`] against a static, ordered rule table. Each key type carries the
//! metadata the translator needs: which association it joins, whether it is a
//! demographic, whether its domains are merged across items, and which other
//! key types it conflicts with.
//!
//! # Classification
//!
//! | Path segments | Key type |
//! |---------------|----------|
//! | `Diagnoses\ICD9` | [`KeyType::Icd9Diagnosis`] |
//! | `Diagnoses\ICD10` | [`KeyType::Icd10Diagnosis`] |
//! | `Procedures\CPT4` | [`KeyType::Cpt4Procedure`] |
//! | `Procedures\ICD9` | [`KeyType::Icd9Procedure`] |
//! | `Labs\LOINC` | [`KeyType::Loinc`] |
//! | `Biospecimens` | [`KeyType::Biospecimen`] |
//! | `Oncology` | [`KeyType::OncologyMalignant`] |
//! | `Medications\RXNORM` | [`KeyType::Rxnorm`] |
//! | `Demographics\<field>` | demographic key types |
//! | `Demographics\Location\<level>` | location key types |
//! | `Encounters\Length of Stay` | [`KeyType::EncounterLengthOfStay`] |
//! | `Encounters\Type` | [`KeyType::EncounterType`] |
//!
//! Before the path rules, a small override table reclassifies keys whose
//! path alone is ambiguous, using the item's exact tool tip.

use std::fmt;

use crate::item_key::ItemKey;

// =============================================================================
// Associations
// =============================================================================

/// Child entity joined from the root object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssociationType {
    /// Coded clinical observations (diagnoses, procedures, labs, ...).
    Observation,
    /// Medication orders.
    Order,
    /// Residence locations.
    Location,
    /// Encounters (visits).
    Encounter,
}

impl AssociationType {
    /// All association types, in allocation order.
    pub const ALL: [AssociationType; 4] = [
        AssociationType::Observation,
        AssociationType::Order,
        AssociationType::Location,
        AssociationType::Encounter,
    ];

    /// Entity type name of the joined association.
    pub fn object_type(&self) -> &'static str {
        match self {
            AssociationType::Observation => "Observation",
            AssociationType::Order => "Order",
            AssociationType::Location => "Location",
            AssociationType::Encounter => "Encounter",
        }
    }

    /// Prefix of generated alias names (`obs1`, `ord1`, ...).
    pub fn alias_prefix(&self) -> &'static str {
        match self {
            AssociationType::Observation => "obs",
            AssociationType::Order => "ord",
            AssociationType::Location => "loc",
            AssociationType::Encounter => "enc",
        }
    }

    /// Association path from the root object.
    pub fn join_path(&self) -> &'static str {
        match self {
            AssociationType::Observation => "observations",
            AssociationType::Order => "orders",
            AssociationType::Location => "locations",
            AssociationType::Encounter => "encounters",
        }
    }

    /// Whether conflicting groups get a fresh alias of this type.
    ///
    /// Only observations currently do; the other associations are always
    /// reused.
    pub fn supports_fresh_alias(&self) -> bool {
        matches!(self, AssociationType::Observation)
    }
}

impl fmt::Display for AssociationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.object_type())
    }
}

// =============================================================================
// Key types
// =============================================================================

/// Classification of a query item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyType {
    /// ICD-9 diagnosis.
    Icd9Diagnosis,
    /// ICD-10 diagnosis.
    Icd10Diagnosis,
    /// CPT-4 procedure.
    Cpt4Procedure,
    /// ICD-9 procedure.
    Icd9Procedure,
    /// LOINC lab result.
    Loinc,
    /// Biospecimen.
    Biospecimen,
    /// Malignant oncology finding.
    OncologyMalignant,
    /// In-situ oncology finding.
    OncologyInSitu,
    /// RxNorm medication order.
    Rxnorm,
    /// Administrative gender.
    Gender,
    /// Primary language.
    Language,
    /// Marital status.
    MaritalStatus,
    /// Race.
    Race,
    /// Religion.
    Religion,
    /// Vital status.
    VitalStatus,
    /// Ethnicity.
    Ethnicity,
    /// Pedigree quality.
    PedigreeQuality,
    /// Age in years.
    Age,
    /// Year of birth.
    BirthYear,
    /// Date of birth.
    BirthDate,
    /// State of residence.
    State,
    /// Health district group of residence.
    HealthDistrictGroup,
    /// County of residence.
    County,
    /// Encounter length of stay in days.
    EncounterLengthOfStay,
    /// Encounter type.
    EncounterType,
    /// Not recognized; contributes no criterion.
    Unknown,
}

impl KeyType {
    /// Classifies a parsed key, consulting tool-tip overrides first.
    pub fn classify_key(key: &ItemKey, tool_tip: &str) -> KeyType {
        TOOL_TIP_OVERRIDES
            .iter()
            .find(|o| o.tool_tip == tool_tip && key.matches_path(o.path))
            .map(|o| o.key_type)
            .or_else(|| {
                CLASSIFICATION_RULES
                    .iter()
                    .find(|(path, _)| key.matches_path(path))
                    .map(|(_, key_type)| *key_type)
            })
            .unwrap_or(KeyType::Unknown)
    }

    /// Association joined by criteria of this type; `None` for properties of
    /// the root object.
    pub fn association(&self) -> Option<AssociationType> {
        match self {
            KeyType::Icd9Diagnosis
            | KeyType::Icd10Diagnosis
            | KeyType::Cpt4Procedure
            | KeyType::Icd9Procedure
            | KeyType::Loinc
            | KeyType::Biospecimen
            | KeyType::OncologyMalignant
            | KeyType::OncologyInSitu => Some(AssociationType::Observation),
            KeyType::Rxnorm => Some(AssociationType::Order),
            KeyType::State | KeyType::HealthDistrictGroup | KeyType::County => {
                Some(AssociationType::Location)
            }
            KeyType::EncounterLengthOfStay | KeyType::EncounterType => {
                Some(AssociationType::Encounter)
            }
            _ => None,
        }
    }

    /// Demographics never take part in conflict detection, and an empty
    /// demographic domain skips the item instead of failing.
    pub fn is_demographic(&self) -> bool {
        matches!(
            self,
            KeyType::Gender
                | KeyType::Language
                | KeyType::MaritalStatus
                | KeyType::Race
                | KeyType::Religion
                | KeyType::VitalStatus
                | KeyType::Ethnicity
                | KeyType::PedigreeQuality
                | KeyType::Age
                | KeyType::BirthYear
                | KeyType::BirthDate
                | KeyType::State
                | KeyType::HealthDistrictGroup
                | KeyType::County
        )
    }

    /// Domains of several items of this type within one group are unioned
    /// into a single criterion.
    pub fn is_grouped_criteria(&self) -> bool {
        matches!(
            self,
            KeyType::Gender
                | KeyType::Language
                | KeyType::MaritalStatus
                | KeyType::Race
                | KeyType::Religion
                | KeyType::VitalStatus
                | KeyType::Ethnicity
                | KeyType::PedigreeQuality
                | KeyType::Age
                | KeyType::BirthYear
                | KeyType::BirthDate
                | KeyType::EncounterLengthOfStay
                | KeyType::EncounterType
        )
    }

    /// Key types that, seen in an earlier group, force this type's group into
    /// a correlated sub-query.
    pub fn conflicts(&self) -> &'static [KeyType] {
        match self.association() {
            Some(AssociationType::Observation) => OBSERVATION_TYPES,
            _ => &[],
        }
    }

    /// Returns true if `other` is in this type's conflict set.
    pub fn conflicts_with(&self, other: KeyType) -> bool {
        self.conflicts().contains(&other)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyType::Icd9Diagnosis => "ICD9_DIAGNOSIS",
            KeyType::Icd10Diagnosis => "ICD10_DIAGNOSIS",
            KeyType::Cpt4Procedure => "CPT4_PROCEDURE",
            KeyType::Icd9Procedure => "ICD9_PROCEDURE",
            KeyType::Loinc => "LOINC",
            KeyType::Biospecimen => "BIOSPECIMEN",
            KeyType::OncologyMalignant => "ONCOLOGY_MALIGNANT",
            KeyType::OncologyInSitu => "ONCOLOGY_IN_SITU",
            KeyType::Rxnorm => "RXNORM",
            KeyType::Gender => "GENDER",
            KeyType::Language => "LANGUAGE",
            KeyType::MaritalStatus => "MARITAL_STATUS",
            KeyType::Race => "RACE",
            KeyType::Religion => "RELIGION",
            KeyType::VitalStatus => "VITAL_STATUS",
            KeyType::Ethnicity => "ETHNICITY",
            KeyType::PedigreeQuality => "PEDIGREE_QUALITY",
            KeyType::Age => "AGE",
            KeyType::BirthYear => "BIRTH_YEAR",
            KeyType::BirthDate => "BIRTH_DATE",
            KeyType::State => "STATE",
            KeyType::HealthDistrictGroup => "HEALTH_DISTRICT_GROUP",
            KeyType::County => "COUNTY",
            KeyType::EncounterLengthOfStay => "ENCOUNTER_LENGTH_OF_STAY",
            KeyType::EncounterType => "ENCOUNTER_TYPE",
            KeyType::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Rule tables
// =============================================================================

const OBSERVATION_TYPES: &[KeyType] = &[
    KeyType::Icd9Diagnosis,
    KeyType::Icd10Diagnosis,
    KeyType::Cpt4Procedure,
    KeyType::Icd9Procedure,
    KeyType::Loinc,
    KeyType::Biospecimen,
    KeyType::OncologyMalignant,
    KeyType::OncologyInSitu,
];

/// Reclassifies a key whose path matches `path` and whose tool tip is
/// exactly `tool_tip`.
#[derive(Debug, Clone, Copy)]
pub struct ToolTipOverride {
    /// Contiguous path segments the key must contain.
    pub path: &'static [&'static str],
    /// Exact tool tip.
    pub tool_tip: &'static str,
    /// Resulting classification.
    pub key_type: KeyType,
}

/// Overrides consulted before [`CLASSIFICATION_RULES`].
pub const TOOL_TIP_OVERRIDES: &[ToolTipOverride] = &[ToolTipOverride {
    path: &["Oncology"],
    tool_tip: "Oncology\\Carcinoma In Situ",
    key_type: KeyType::OncologyInSitu,
}];

/// Path rules in match order; the first rule whose segments occur
/// contiguously in the key wins.
pub const CLASSIFICATION_RULES: &[(&[&str], KeyType)] = &[
    (&["Diagnoses", "ICD9"], KeyType::Icd9Diagnosis),
    (&["Diagnoses", "ICD10"], KeyType::Icd10Diagnosis),
    (&["Procedures", "CPT4"], KeyType::Cpt4Procedure),
    (&["Procedures", "ICD9"], KeyType::Icd9Procedure),
    (&["Labs", "LOINC"], KeyType::Loinc),
    (&["Biospecimens"], KeyType::Biospecimen),
    (&["Oncology"], KeyType::OncologyMalignant),
    (&["Medications", "RXNORM"], KeyType::Rxnorm),
    (&["Demographics", "Location", "State"], KeyType::State),
    (
        &["Demographics", "Location", "Health District Group"],
        KeyType::HealthDistrictGroup,
    ),
    (&["Demographics", "Location", "County"], KeyType::County),
    (&["Demographics", "Gender"], KeyType::Gender),
    (&["Demographics", "Language"], KeyType::Language),
    (&["Demographics", "Marital Status"], KeyType::MaritalStatus),
    (&["Demographics", "Race"], KeyType::Race),
    (&["Demographics", "Religion"], KeyType::Religion),
    (&["Demographics", "Vital Status"], KeyType::VitalStatus),
    (&["Demographics", "Ethnicity"], KeyType::Ethnicity),
    (
        &["Demographics", "Pedigree Quality"],
        KeyType::PedigreeQuality,
    ),
    (&["Demographics", "Age"], KeyType::Age),
    (&["Demographics", "Birth Year"], KeyType::BirthYear),
    (&["Demographics", "Birth Date"], KeyType::BirthDate),
    (
        &["Encounters", "Length of Stay"],
        KeyType::EncounterLengthOfStay,
    ),
    (&["Encounters", "Type"], KeyType::EncounterType),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_key::parse_item_key;

    fn classify(key: &str) -> KeyType {
        match parse_item_key(key) {
            Ok(key) => KeyType::classify_key(&key, ""),
            Err(_) => KeyType::Unknown,
        }
    }

    #[test]
    fn test_classify_vocabularies() {
        assert_eq!(
            classify("\\\\i2b2\\Diagnoses\\ICD9\\250\\"),
            KeyType::Icd9Diagnosis
        );
        assert_eq!(
            classify("\\\\i2b2\\Diagnoses\\ICD10\\E11\\"),
            KeyType::Icd10Diagnosis
        );
        assert_eq!(
            classify("\\\\i2b2\\Procedures\\CPT4\\99213\\"),
            KeyType::Cpt4Procedure
        );
        assert_eq!(classify("\\\\i2b2\\Labs\\LOINC\\2345-7\\"), KeyType::Loinc);
        assert_eq!(
            classify("\\\\i2b2\\Medications\\RXNORM\\6809\\"),
            KeyType::Rxnorm
        );
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(classify("\\\\i2b2\\labs\\loinc\\2345-7\\"), KeyType::Loinc);
    }

    #[test]
    fn test_classify_location_before_demographics() {
        assert_eq!(
            classify("\\\\i2b2\\Demographics\\Location\\State\\TX\\"),
            KeyType::State
        );
        assert_eq!(
            classify("\\\\i2b2\\Demographics\\Location\\County\\Travis\\"),
            KeyType::County
        );
    }

    #[test]
    fn test_classify_unparsable_is_unknown() {
        assert_eq!(classify("not a key"), KeyType::Unknown);
        assert_eq!(classify("\\\\i2b2\\Something\\Else\\"), KeyType::Unknown);
    }

    #[test]
    fn test_tool_tip_override() {
        let key = parse_item_key("\\\\i2b2\\Oncology\\8010\\").unwrap();
        assert_eq!(
            KeyType::classify_key(&key, "Oncology\\Carcinoma In Situ"),
            KeyType::OncologyInSitu
        );
        assert_eq!(
            KeyType::classify_key(&key, "Oncology"),
            KeyType::OncologyMalignant
        );
    }

    #[test]
    fn test_observation_types_conflict() {
        assert!(KeyType::Loinc.conflicts_with(KeyType::Icd9Diagnosis));
        assert!(KeyType::Loinc.conflicts_with(KeyType::Loinc));
        assert!(!KeyType::Loinc.conflicts_with(KeyType::Rxnorm));
        assert!(!KeyType::Rxnorm.conflicts_with(KeyType::Loinc));
        assert!(KeyType::Gender.conflicts().is_empty());
    }

    #[test]
    fn test_metadata() {
        assert_eq!(
            KeyType::Loinc.association(),
            Some(AssociationType::Observation)
        );
        assert_eq!(KeyType::Gender.association(), None);
        assert!(KeyType::State.is_demographic());
        assert!(!KeyType::State.is_grouped_criteria());
        assert!(KeyType::EncounterType.is_grouped_criteria());
        assert!(!KeyType::EncounterType.is_demographic());
    }

    #[test]
    fn test_only_observations_mint_fresh_aliases() {
        let fresh: Vec<AssociationType> = AssociationType::ALL
            .into_iter()
            .filter(|a| a.supports_fresh_alias())
            .collect();
        assert_eq!(fresh, vec![AssociationType::Observation]);
    }
}
