use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::{Field, FormSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem found in a form schema before any answers are evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaIssue {
    pub field_id: String,
    pub code: String,
    pub message: String,
    pub severity: Severity,
}

impl SchemaIssue {
    fn error(field: &Field, code: &str, message: String) -> Self {
        Self {
            field_id: field.id.clone(),
            code: code.into(),
            message,
            severity: Severity::Error,
        }
    }

    fn warning(field: &Field, code: &str, message: String) -> Self {
        Self {
            field_id: field.id.clone(),
            code: code.into(),
            message,
            severity: Severity::Warning,
        }
    }
}

/// Reports schema problems in field order.
///
/// Errors: duplicate ids, props dropped at load time, conditions without a
/// controlling field, unknown operators, references to fields missing from
/// the schema. Warnings:
/// self-references, conditions on a field that is itself conditional (its
/// visibility is not taken into account), and operators that can never match
/// on a numeric field.
pub fn lint(schema: &FormSchema) -> Vec<SchemaIssue> {
    let mut issues = Vec::new();
    let mut seen = BTreeSet::new();

    for field in schema {
        if !seen.insert(field.id.as_str()) {
            issues.push(SchemaIssue::error(
                field,
                "duplicate_id",
                format!("field id '{}' is used more than once", field.id),
            ));
        }

        for prop in &field.ignored_props {
            issues.push(SchemaIssue::error(
                field,
                "invalid_props",
                format!("prop '{}' has an unusable shape and was ignored", prop),
            ));
        }

        let Some(condition) = &field.condition else {
            continue;
        };

        if !condition.operator.is_known() {
            issues.push(SchemaIssue::error(
                field,
                "unknown_operator",
                format!("unknown condition operator '{}'", condition.operator),
            ));
        }

        let Some(target_id) = condition.controlling_field() else {
            issues.push(SchemaIssue::error(
                field,
                "missing_field_id",
                "condition does not name a controlling field".into(),
            ));
            continue;
        };

        if target_id == field.id {
            issues.push(SchemaIssue::warning(
                field,
                "self_reference",
                "condition depends on the field's own answer".into(),
            ));
        }

        let Some(target) = schema.field(target_id) else {
            issues.push(SchemaIssue::error(
                field,
                "dangling_reference",
                format!("condition references unknown field '{}'", target_id),
            ));
            continue;
        };

        if target.id != field.id && target.condition.is_some() {
            issues.push(SchemaIssue::warning(
                field,
                "chained_condition",
                format!(
                    "controlling field '{}' is itself conditional; its visibility is not checked",
                    target.id
                ),
            ));
        }

        if target.kind.is_numeric()
            && condition.operator.is_known()
            && !condition.operator.is_presence_check()
            && !condition.operator.is_numeric()
        {
            issues.push(SchemaIssue::warning(
                field,
                "operator_never_matches",
                format!(
                    "operator '{}' never matches numeric field '{}'",
                    condition.operator, target.id
                ),
            ));
        }
    }

    issues
}

pub fn has_errors(issues: &[SchemaIssue]) -> bool {
    issues.iter().any(|issue| issue.severity == Severity::Error)
}

