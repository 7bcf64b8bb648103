pub mod condition;
pub mod field;
pub mod schema;

use thiserror::Error;

use crate::lint::SchemaIssue;

pub use condition::{Condition, ConditionOperator};
pub use field::{
    BasicProps, CommonProps, Field, FieldKind, FieldType, MatrixProps, OtherProps, SliderProps,
};
pub use schema::FormSchema;

/// Failures while loading a form schema from the forms API.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse form json: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("form response does not contain a field list")]
    MissingFields,
    #[error("form rejected with {} lint error(s)", .0.len())]
    Rejected(Vec<SchemaIssue>),
    #[error("json encode error: {0}")]
    Encode(#[source] serde_json::Error),
}
