use serde_json::{Map, Value, json};

use crate::answers::{display_string, is_empty_answer};
use crate::spec::FormSchema;
use crate::visibility::resolve_visibility;

/// Per-field row of a [`VisibilityReport`].
#[derive(Debug, Clone)]
pub struct ReportField {
    pub id: String,
    pub label: String,
    pub kind: String,
    pub required: bool,
    pub visible: bool,
    pub condition: Option<String>,
    pub current_value: Option<Value>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct VisibilityReport {
    pub total: usize,
    pub visible: usize,
    pub answered: usize,
    pub fields: Vec<ReportField>,
}

impl VisibilityReport {
    pub fn visible_ids(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.visible)
            .map(|field| field.id.as_str())
            .collect()
    }

    pub fn hidden_ids(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| !field.visible)
            .map(|field| field.id.as_str())
            .collect()
    }
}

/// Build the report from the schema and the current answers.
pub fn build_report(schema: &FormSchema, answers: &Value) -> VisibilityReport {
    let visibility = resolve_visibility(schema, answers);

    let fields = schema
        .iter()
        .map(|field| {
            let answer = answers
                .get(&field.id)
                .filter(|value| !is_empty_answer(Some(*value)));
            ReportField {
                id: field.id.clone(),
                label: field.label().to_string(),
                kind: field.kind.tag().to_string(),
                required: field.is_required(),
                visible: visibility.get(&field.id).copied().unwrap_or(true),
                condition: field.condition.as_ref().map(ToString::to_string),
                current_value: answer.cloned(),
            }
        })
        .collect::<Vec<_>>();

    let visible = fields.iter().filter(|field| field.visible).count();
    let answered = fields
        .iter()
        .filter(|field| field.visible && field.current_value.is_some())
        .count();

    VisibilityReport {
        total: fields.len(),
        visible,
        answered,
        fields,
    }
}

/// Render the report as a structured JSON value.
pub fn render_json(report: &VisibilityReport) -> Value {
    let fields = report
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.clone()));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            if let Some(condition) = &field.condition {
                map.insert("condition".into(), Value::String(condition.clone()));
            }
            if let Some(current_value) = &field.current_value {
                map.insert("current_value".into(), current_value.clone());
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "visible": report.visible_ids(),
        "hidden": report.hidden_ids(),
        "progress": {
            "answered": report.answered,
            "visible": report.visible,
            "total": report.total,
        },
        "fields": fields,
    })
}

/// Render the report as human-friendly text.
pub fn render_text(report: &VisibilityReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Visible: {}/{} (answered {})",
        report.visible, report.total, report.answered
    ));

    lines.push("Visible fields:".to_string());
    for field in report.fields.iter().filter(|field| field.visible) {
        let mut entry = format!(" - {} ({}, {})", field.id, field.label, field.kind);
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(current_value) = &field.current_value {
            entry.push_str(&format!(" = {}", display_string(current_value)));
        }
        lines.push(entry);
    }

    let hidden = report
        .fields
        .iter()
        .filter(|field| !field.visible)
        .collect::<Vec<_>>();
    if !hidden.is_empty() {
        lines.push("Hidden fields:".to_string());
        for field in hidden {
            let mut entry = format!(" - {} ({})", field.id, field.label);
            if let Some(condition) = &field.condition {
                entry.push_str(&format!(" when {}", condition));
            }
            lines.push(entry);
        }
    }

    lines.join("\n")
}
