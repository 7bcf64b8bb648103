use schemars::schema_for;
use serde_json::Value;

use crate::spec::{FormSchema, SchemaError};
use crate::validate::ValidationResult;

/// JSON Schema describing the field list accepted by [`FormSchema`].
pub fn form_schema_document() -> Result<Value, SchemaError> {
    serde_json::to_value(schema_for!(FormSchema)).map_err(SchemaError::Encode)
}

/// JSON Schema of the answer validation report.
pub fn validation_schema_document() -> Result<Value, SchemaError> {
    serde_json::to_value(schema_for!(ValidationResult)).map_err(SchemaError::Encode)
}
