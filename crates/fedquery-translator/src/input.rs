//! Query-builder input model.
//!
//! Groups are ANDed together, items within a group are ORed. The caller builds
//! these values before translation; the translator only reads them.

use chrono::NaiveDate;

/// One panel of the visual query builder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryGroup {
    /// Selected concept items, ORed together.
    pub items: Vec<QueryItem>,
    /// Negate the whole group.
    pub inverted: bool,
}

impl QueryGroup {
    /// Creates a non-inverted group.
    pub fn new(items: Vec<QueryItem>) -> Self {
        Self {
            items,
            inverted: false,
        }
    }

    /// Creates an inverted group.
    pub fn inverted(items: Vec<QueryItem>) -> Self {
        Self {
            items,
            inverted: true,
        }
    }
}

/// A concept item selected in a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryItem {
    /// Hierarchical concept key, e.g. `\\i2b2\Labs\LOINC\2345-7\`.
    pub item_key: String,
    /// Display tool tip of the concept.
    pub tool_tip: String,
    /// Optional constraint on the observed value (labs).
    pub value_constraint: Option<ValueConstraint>,
    /// Optional constraint on the observation date.
    pub date_constraint: Option<DateConstraint>,
}

impl QueryItem {
    /// Creates an unconstrained item.
    pub fn new(item_key: impl Into<String>) -> Self {
        Self {
            item_key: item_key.into(),
            ..Self::default()
        }
    }

    /// Sets the tool tip.
    pub fn with_tool_tip(mut self, tool_tip: impl Into<String>) -> Self {
        self.tool_tip = tool_tip.into();
        self
    }

    /// Sets the value constraint.
    pub fn with_value(mut self, constraint: ValueConstraint) -> Self {
        self.value_constraint = Some(constraint);
        self
    }

    /// Sets the date constraint.
    pub fn with_dates(mut self, constraint: DateConstraint) -> Self {
        self.date_constraint = Some(constraint);
        self
    }
}

/// Kind of a value constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    /// Numeric result compared with `operator`.
    Number,
    /// Abnormality flag (`H`, `L`, `N` or `A`).
    Flag,
}

/// Operator of a value constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueOperator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Inclusive range; the value is `"<low> and <high>"`.
    Between,
}

/// Constraint on an item's observed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueConstraint {
    /// Number or flag.
    pub value_type: ValueType,
    /// Comparison operator.
    pub operator: ValueOperator,
    /// Constrained value text.
    pub value: String,
    /// Unit code; `"undefined"` means none.
    pub unit_of_measure: Option<String>,
}

impl ValueConstraint {
    /// Numeric constraint without a unit.
    pub fn number(operator: ValueOperator, value: impl Into<String>) -> Self {
        Self {
            value_type: ValueType::Number,
            operator,
            value: value.into(),
            unit_of_measure: None,
        }
    }

    /// Flag equality constraint.
    pub fn flag(flag: impl Into<String>) -> Self {
        Self {
            value_type: ValueType::Flag,
            operator: ValueOperator::Eq,
            value: flag.into(),
            unit_of_measure: None,
        }
    }

    /// Sets the unit of measure.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit_of_measure = Some(unit.into());
        self
    }
}

/// Inclusive date window on an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateConstraint {
    /// Earliest date, if bounded.
    pub from: Option<NaiveDate>,
    /// Latest date, if bounded.
    pub to: Option<NaiveDate>,
}

impl DateConstraint {
    /// Creates a date window.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }
}
