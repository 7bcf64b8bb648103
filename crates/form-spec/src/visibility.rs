use serde_json::Value;
use tracing::debug;

use crate::evaluate::evaluate;
use crate::spec::{Field, FormSchema};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Fields currently visible, in schema order. An absent schema yields nothing.
pub fn resolve<'a>(schema: Option<&'a FormSchema>, answers: &Value) -> Vec<&'a Field> {
    match schema {
        Some(schema) => visible_fields(schema, answers),
        None => Vec::new(),
    }
}

/// Stable filter of `schema` by each field's condition.
pub fn visible_fields<'a>(schema: &'a FormSchema, answers: &Value) -> Vec<&'a Field> {
    let visible = schema
        .iter()
        .filter(|field| evaluate(field.condition.as_ref(), answers, schema))
        .collect::<Vec<_>>();
    debug!(
        total = schema.len(),
        visible = visible.len(),
        "resolved visible fields"
    );
    visible
}

/// Visibility flag per field id.
pub fn resolve_visibility(schema: &FormSchema, answers: &Value) -> VisibilityMap {
    let mut map = VisibilityMap::new();
    for field in schema {
        let visible = evaluate(field.condition.as_ref(), answers, schema);
        map.insert(field.id.clone(), visible);
    }
    map
}
