use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::{choice_index, is_date, is_empty_answer, is_time, to_number_or_nan};
use crate::spec::{Field, FieldKind, FormSchema, MatrixProps, SliderProps};
use crate::visibility::resolve_visibility;

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://\S+$").expect("link pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub field_id: String,
    pub path: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
    /// Answers kept for fields the current answers hide; informational only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_answers: Vec<String>,
}

/// Checks answers against the fields that are visible for those answers.
pub fn validate(schema: &FormSchema, answers: &Value) -> ValidationResult {
    let visibility = resolve_visibility(schema, answers);
    let answers_map = answers.as_object().cloned().unwrap_or_default();

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();
    let mut hidden_answers = Vec::new();

    for field in schema {
        let answer = answers_map.get(&field.id);
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            if !is_empty_answer(answer) {
                hidden_answers.push(field.id.clone());
            }
            continue;
        }

        match answer.filter(|value| !is_empty_answer(Some(*value))) {
            None => {
                if field.is_required() {
                    missing_required.push(field.id.clone());
                }
            }
            Some(value) => {
                if let Some(error) = validate_value(field, value) {
                    errors.push(error);
                }
            }
        }
    }

    let unknown_fields: Vec<String> = answers_map
        .keys()
        .filter(|key| !schema.contains(key))
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
        hidden_answers,
    }
}

fn validate_value(field: &Field, value: &Value) -> Option<ValidationError> {
    match &field.kind {
        FieldKind::ShortText(props) | FieldKind::LongText(props) => {
            if !(value.is_string() || value.is_number()) {
                return Some(base_error(field, "expected text", "type_mismatch"));
            }
            if props.common.input_type.as_deref() == Some("number")
                && to_number_or_nan(value).is_nan()
            {
                return Some(base_error(field, "expected a number", "type_mismatch"));
            }
            None
        }
        FieldKind::Combobox(_) => {
            if value.is_array() || value.is_object() {
                return Some(base_error(field, "expected a single choice", "type_mismatch"));
            }
            check_choice(field, field.kind.choices(), value)
        }
        FieldKind::MultiChoice(_) => {
            let Some(items) = value.as_array() else {
                return Some(base_error(field, "expected a list of choices", "type_mismatch"));
            };
            items
                .iter()
                .find_map(|item| check_choice(field, field.kind.choices(), item))
        }
        FieldKind::Date(_) => check_pattern(field, value, is_date, "expected YYYY-MM-DD"),
        FieldKind::Time(_) => check_pattern(field, value, is_time, "expected HH:MM"),
        FieldKind::Link(_) => check_pattern(
            field,
            value,
            |text| LINK_PATTERN.is_match(text),
            "expected an http(s) link",
        ),
        FieldKind::File(_) => {
            let valid = match value {
                Value::String(_) => true,
                Value::Array(items) => items.iter().all(Value::is_string),
                _ => false,
            };
            (!valid).then(|| base_error(field, "expected file reference(s)", "type_mismatch"))
        }
        FieldKind::Slider(props) => check_range(field, props, value),
        FieldKind::Matrix(props) => check_matrix(field, props, value),
        FieldKind::Other { .. } => None,
    }
}

fn check_choice(field: &Field, choices: Option<&[String]>, value: &Value) -> Option<ValidationError> {
    let choices = choices?;
    if let Some(index) = choice_index(value)
        && index < choices.len()
    {
        return None;
    }
    match value.as_str() {
        Some(label) if choices.iter().any(|choice| choice == label) => None,
        _ => Some(base_error(field, "invalid choice option", "invalid_choice")),
    }
}

fn check_pattern(
    field: &Field,
    value: &Value,
    matches: impl Fn(&str) -> bool,
    message: &str,
) -> Option<ValidationError> {
    match value.as_str() {
        Some(text) if matches(text) => None,
        Some(_) => Some(base_error(field, message, "invalid_format")),
        None => Some(base_error(field, message, "type_mismatch")),
    }
}

fn check_range(field: &Field, props: &SliderProps, value: &Value) -> Option<ValidationError> {
    let number = to_number_or_nan(value);
    if number.is_nan() {
        return Some(base_error(field, "expected a number", "type_mismatch"));
    }
    if let Some(min) = props.min
        && number < min
    {
        return Some(base_error(field, "value below minimum", "min"));
    }
    if let Some(max) = props.max
        && number > max
    {
        return Some(base_error(field, "value above maximum", "max"));
    }
    None
}

fn check_matrix(field: &Field, props: &MatrixProps, value: &Value) -> Option<ValidationError> {
    let Some(map) = value.as_object() else {
        return Some(base_error(field, "expected row answers", "type_mismatch"));
    };
    if !props.rows.is_empty() && map.keys().any(|row| !props.rows.contains(row)) {
        return Some(base_error(field, "answer for unknown row", "invalid_row"));
    }
    None
}

fn base_error(field: &Field, message: &str, code: &str) -> ValidationError {
    ValidationError {
        field_id: field.id.clone(),
        path: format!("/{}", field.id),
        message: message.into(),
        code: code.into(),
    }
}
