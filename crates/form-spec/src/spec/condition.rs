use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::display_string;

/// Comparison applied by a [`Condition`].
///
/// Operator strings the engine does not know are kept verbatim in
/// [`ConditionOperator::Unknown`] so that evaluation can apply its fallback
/// rules instead of rejecting the form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum ConditionOperator {
    IsSet,
    IsEmpty,
    IsTrue,
    IsFalse,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Before,
    After,
    Contains,
    StartsWith,
    EndsWith,
    Unknown(String),
}

impl ConditionOperator {
    pub const KNOWN: [ConditionOperator; 13] = [
        ConditionOperator::IsSet,
        ConditionOperator::IsEmpty,
        ConditionOperator::IsTrue,
        ConditionOperator::IsFalse,
        ConditionOperator::Equals,
        ConditionOperator::NotEquals,
        ConditionOperator::GreaterThan,
        ConditionOperator::LessThan,
        ConditionOperator::Before,
        ConditionOperator::After,
        ConditionOperator::Contains,
        ConditionOperator::StartsWith,
        ConditionOperator::EndsWith,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::IsSet => "is_set",
            ConditionOperator::IsEmpty => "is_empty",
            ConditionOperator::IsTrue => "is_true",
            ConditionOperator::IsFalse => "is_false",
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Before => "before",
            ConditionOperator::After => "after",
            ConditionOperator::Contains => "contains",
            ConditionOperator::StartsWith => "starts_with",
            ConditionOperator::EndsWith => "ends_with",
            ConditionOperator::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ConditionOperator::Unknown(_))
    }

    /// Operators with a meaning on the numeric comparison path.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Equals
                | ConditionOperator::NotEquals
                | ConditionOperator::GreaterThan
                | ConditionOperator::LessThan
        )
    }

    /// Operators decided before any type-specific comparison runs.
    pub fn is_presence_check(&self) -> bool {
        matches!(
            self,
            ConditionOperator::IsSet
                | ConditionOperator::IsEmpty
                | ConditionOperator::IsTrue
                | ConditionOperator::IsFalse
        )
    }
}

impl Default for ConditionOperator {
    fn default() -> Self {
        ConditionOperator::Unknown(String::new())
    }
}

impl From<&str> for ConditionOperator {
    fn from(raw: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|operator| operator.as_str() == raw)
            .cloned()
            .unwrap_or_else(|| ConditionOperator::Unknown(raw.to_string()))
    }
}

impl From<Option<String>> for ConditionOperator {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(Self::from).unwrap_or_default()
    }
}

impl From<ConditionOperator> for String {
    fn from(operator: ConditionOperator) -> Self {
        match operator {
            ConditionOperator::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-clause visibility rule attached to a field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    /// Id of the controlling field whose answer is tested.
    #[serde(rename = "fieldId", default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default)]
    #[schemars(with = "String")]
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
}

impl Condition {
    pub fn new(
        field_id: impl Into<String>,
        operator: impl Into<ConditionOperator>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field_id: Some(field_id.into()),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Controlling field id; a blank id counts as none.
    pub fn controlling_field(&self) -> Option<&str> {
        self.field_id.as_deref().filter(|id| !id.is_empty())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.controlling_field().unwrap_or("?");
        if self.operator.is_presence_check() {
            write!(f, "{} {}", field, self.operator)
        } else {
            write!(f, "{} {} {}", field, self.operator, display_string(&self.value))
        }
    }
}
