use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::lint::{Severity, lint};
use crate::spec::SchemaError;
use crate::spec::field::Field;

/// Ordered list of fields making up a form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FormSchema {
    pub fields: Vec<Field>,
}

impl FormSchema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// First field carrying `id`.
    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.field(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Extracts the field list from a form fetch response body.
    ///
    /// Looks at `data.form` (either the field array itself or an object with a
    /// `fields` array), then a top-level `fields` array, then accepts a bare
    /// array.
    pub fn from_response(body: &Value) -> Result<Self, SchemaError> {
        let fields = body
            .pointer("/data/form")
            .and_then(|form| match form {
                Value::Array(_) => Some(form),
                Value::Object(map) => map.get("fields").filter(|fields| fields.is_array()),
                _ => None,
            })
            .or_else(|| body.get("fields").filter(|fields| fields.is_array()))
            .or_else(|| body.is_array().then_some(body))
            .ok_or(SchemaError::MissingFields)?;

        let fields: Vec<Field> =
            serde_json::from_value(fields.clone()).map_err(SchemaError::Parse)?;
        debug!(fields = fields.len(), "loaded form schema");
        Ok(Self { fields })
    }

    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let body: Value = serde_json::from_str(json).map_err(SchemaError::Parse)?;
        Self::from_response(&body)
    }

    /// Rejects the schema when linting finds error-level issues.
    pub fn strict(self) -> Result<Self, SchemaError> {
        let errors: Vec<_> = lint(&self)
            .into_iter()
            .filter(|issue| issue.severity == Severity::Error)
            .collect();
        if errors.is_empty() {
            return Ok(self);
        }
        for issue in &errors {
            warn!(field_id = %issue.field_id, code = %issue.code, "{}", issue.message);
        }
        Err(SchemaError::Rejected(errors))
    }
}

impl<'a> IntoIterator for &'a FormSchema {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl From<Vec<Field>> for FormSchema {
    fn from(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}
