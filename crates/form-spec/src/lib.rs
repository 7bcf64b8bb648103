#![allow(missing_docs)]

pub mod answers;
pub mod evaluate;
pub mod json_schema;
pub mod lint;
pub mod report;
pub mod spec;
pub mod validate;
pub mod visibility;

pub use answers::{Answer, answer_for, is_empty_answer, to_number_or_nan};
pub use evaluate::evaluate;
pub use json_schema::{form_schema_document, validation_schema_document};
pub use lint::{SchemaIssue, Severity, has_errors, lint};
pub use report::{ReportField, VisibilityReport, build_report, render_json, render_text};
pub use spec::{
    Condition, ConditionOperator, Field, FieldKind, FieldType, FormSchema, SchemaError,
};
pub use validate::{ValidationError, ValidationResult, validate};
pub use visibility::{VisibilityMap, resolve, resolve_visibility, visible_fields};
