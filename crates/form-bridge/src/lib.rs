use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    Condition, FormSchema, SchemaError, build_report, evaluate as evaluate_spec_condition, lint,
    render_json as spec_render_json, render_text as spec_render_text, resolve_visibility,
    validate, visible_fields as spec_visible_fields,
};

#[derive(Debug, Error)]
enum BridgeError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("config does not carry a form")]
    FormMissing,
    #[error("failed to parse condition: {0}")]
    ConditionParse(#[source] serde_json::Error),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct BridgeConfig {
    /// Form fetch response body, or the bare field array, as a JSON string.
    #[serde(default)]
    form_json: Option<String>,
    /// Reject forms whose conditions fail linting.
    #[serde(default)]
    strict: bool,
}

fn load_form(config_json: &str) -> Result<FormSchema, BridgeError> {
    let config: BridgeConfig = if config_json.trim().is_empty() {
        BridgeConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(BridgeError::ConfigParse)?
    };

    let form_json = config.form_json.as_deref().ok_or(BridgeError::FormMissing)?;
    let schema = FormSchema::from_json_str(form_json)?;
    if config.strict {
        Ok(schema.strict()?)
    } else {
        Ok(schema)
    }
}

fn parse_answers(answers_json: &str) -> Value {
    serde_json::from_str::<Value>(answers_json)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| Value::Object(Map::new()))
}

fn respond(result: Result<Value, BridgeError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, BridgeError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

/// Visible fields, in form order, as their wire JSON.
pub fn visible_fields(config_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        let visible = spec_visible_fields(&schema, &answers);
        debug!(visible = visible.len(), "bridge resolved visible fields");
        serde_json::to_value(visible).map_err(BridgeError::JsonEncode)
    }))
}

/// Visibility flag for every field id.
pub fn visibility(config_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        serde_json::to_value(resolve_visibility(&schema, &answers))
            .map_err(BridgeError::JsonEncode)
    }))
}

/// Evaluates a single condition; `null` means "no condition".
pub fn evaluate_condition(config_json: &str, condition_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).and_then(|schema| {
        let condition: Option<Condition> =
            serde_json::from_str(condition_json).map_err(BridgeError::ConditionParse)?;
        let answers = parse_answers(answers_json);
        let satisfied = evaluate_spec_condition(condition.as_ref(), &answers, &schema);
        Ok(json!({ "satisfied": satisfied }))
    }))
}

pub fn lint_form(config_json: &str) -> String {
    respond(load_form(config_json).and_then(|schema| {
        let issues = lint(&schema);
        serde_json::to_value(issues).map_err(BridgeError::JsonEncode)
    }))
}

pub fn validate_answers(config_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).and_then(|schema| {
        let answers = parse_answers(answers_json);
        serde_json::to_value(validate(&schema, &answers)).map_err(BridgeError::JsonEncode)
    }))
}

pub fn render_text(config_json: &str, answers_json: &str) -> String {
    respond_string(load_form(config_json).map(|schema| {
        let answers = parse_answers(answers_json);
        spec_render_text(&build_report(&schema, &answers))
    }))
}

pub fn render_json(config_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).map(|schema| {
        let answers = parse_answers(answers_json);
        spec_render_json(&build_report(&schema, &answers))
    }))
}
