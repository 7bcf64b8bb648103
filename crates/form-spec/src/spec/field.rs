use std::fmt;

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::answers::{display_string, is_falsy};
use crate::spec::condition::Condition;

/// Wire tags for the field types the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    ShortText,
    LongText,
    Combobox,
    MultiChoice,
    Date,
    Time,
    File,
    Link,
    Slider,
    Matrix,
}

impl FieldType {
    pub const ALL: [FieldType; 10] = [
        FieldType::ShortText,
        FieldType::LongText,
        FieldType::Combobox,
        FieldType::MultiChoice,
        FieldType::Date,
        FieldType::Time,
        FieldType::File,
        FieldType::Link,
        FieldType::Slider,
        FieldType::Matrix,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::ShortText => "short_text",
            FieldType::LongText => "long_text",
            FieldType::Combobox => "combobox",
            FieldType::MultiChoice => "multi_choice",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::File => "file",
            FieldType::Link => "link",
            FieldType::Slider => "slider",
            FieldType::Matrix => "matrix",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == raw)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Props shared by every field type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// HTML input type hint; `"number"` switches conditions to numeric comparison.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    /// Option labels; index answers resolve against them whatever the field type.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_labels"
    )]
    #[schemars(with = "Option<Vec<String>>")]
    pub choices: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BasicProps {
    #[serde(flatten)]
    pub common: CommonProps,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SliderProps {
    #[serde(flatten)]
    pub common: CommonProps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MatrixProps {
    #[serde(flatten)]
    pub common: CommonProps,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_label_list"
    )]
    #[schemars(with = "Vec<String>")]
    pub rows: Vec<String>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_label_list"
    )]
    #[schemars(with = "Vec<String>")]
    pub columns: Vec<String>,
}

/// Props of a field whose type tag is not one the engine models.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OtherProps {
    #[serde(flatten)]
    pub common: CommonProps,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Field type together with its type-specific props.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    ShortText(BasicProps),
    LongText(BasicProps),
    Combobox(BasicProps),
    MultiChoice(BasicProps),
    Date(BasicProps),
    Time(BasicProps),
    File(BasicProps),
    Link(BasicProps),
    Slider(SliderProps),
    Matrix(MatrixProps),
    Other { tag: String, props: OtherProps },
}

impl FieldKind {
    /// Decodes `props` according to the `type` tag.
    ///
    /// Never fails: props whose JSON shape does not fit are dropped and their
    /// names returned alongside the kind.
    pub fn decode(tag: &str, props: Value) -> (Self, Vec<String>) {
        let kind = FieldType::parse(tag);
        let mut ignored = Vec::new();
        let props = Value::Object(sanitize_props(kind, props, &mut ignored));
        let Some(kind) = kind else {
            let props = decode_props(props, &mut ignored);
            return (
                FieldKind::Other {
                    tag: tag.to_string(),
                    props,
                },
                ignored,
            );
        };
        let kind = match kind {
            FieldType::ShortText => FieldKind::ShortText(decode_props(props, &mut ignored)),
            FieldType::LongText => FieldKind::LongText(decode_props(props, &mut ignored)),
            FieldType::Combobox => FieldKind::Combobox(decode_props(props, &mut ignored)),
            FieldType::MultiChoice => FieldKind::MultiChoice(decode_props(props, &mut ignored)),
            FieldType::Date => FieldKind::Date(decode_props(props, &mut ignored)),
            FieldType::Time => FieldKind::Time(decode_props(props, &mut ignored)),
            FieldType::File => FieldKind::File(decode_props(props, &mut ignored)),
            FieldType::Link => FieldKind::Link(decode_props(props, &mut ignored)),
            FieldType::Slider => FieldKind::Slider(decode_props(props, &mut ignored)),
            FieldType::Matrix => FieldKind::Matrix(decode_props(props, &mut ignored)),
        };
        (kind, ignored)
    }

    /// Known field type, or `None` for an unmodelled tag.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldKind::ShortText(_) => Some(FieldType::ShortText),
            FieldKind::LongText(_) => Some(FieldType::LongText),
            FieldKind::Combobox(_) => Some(FieldType::Combobox),
            FieldKind::MultiChoice(_) => Some(FieldType::MultiChoice),
            FieldKind::Date(_) => Some(FieldType::Date),
            FieldKind::Time(_) => Some(FieldType::Time),
            FieldKind::File(_) => Some(FieldType::File),
            FieldKind::Link(_) => Some(FieldType::Link),
            FieldKind::Slider(_) => Some(FieldType::Slider),
            FieldKind::Matrix(_) => Some(FieldType::Matrix),
            FieldKind::Other { .. } => None,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            FieldKind::Other { tag, .. } => tag,
            known => known.field_type().map(|kind| kind.as_str()).unwrap_or_default(),
        }
    }

    pub fn common(&self) -> &CommonProps {
        match self {
            FieldKind::ShortText(props)
            | FieldKind::LongText(props)
            | FieldKind::Combobox(props)
            | FieldKind::MultiChoice(props)
            | FieldKind::Date(props)
            | FieldKind::Time(props)
            | FieldKind::File(props)
            | FieldKind::Link(props) => &props.common,
            FieldKind::Slider(props) => &props.common,
            FieldKind::Matrix(props) => &props.common,
            FieldKind::Other { props, .. } => &props.common,
        }
    }

    /// Configured option labels, used for choice-index resolution.
    pub fn choices(&self) -> Option<&[String]> {
        self.common().choices.as_deref()
    }

    pub fn input_type(&self) -> Option<&str> {
        self.common().input_type.as_deref()
    }

    /// Conditions on this field compare numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Slider(_)) || self.input_type() == Some("number")
    }

    fn props_value(&self) -> Value {
        let encoded = match self {
            FieldKind::ShortText(props)
            | FieldKind::LongText(props)
            | FieldKind::Combobox(props)
            | FieldKind::MultiChoice(props)
            | FieldKind::Date(props)
            | FieldKind::Time(props)
            | FieldKind::File(props)
            | FieldKind::Link(props) => serde_json::to_value(props),
            FieldKind::Slider(props) => serde_json::to_value(props),
            FieldKind::Matrix(props) => serde_json::to_value(props),
            FieldKind::Other { props, .. } => serde_json::to_value(props),
        };
        encoded.unwrap_or_else(|_| Value::Object(Map::new()))
    }
}

const TEXT_PROPS: [&str; 4] = ["label", "description", "placeholder", "inputType"];
const SLIDER_PROPS: [&str; 3] = ["min", "max", "step"];
const MATRIX_PROPS: [&str; 2] = ["rows", "columns"];

/// Drops props whose JSON shape the typed model cannot hold and coerces
/// `required` to a boolean by truthiness. Dropped names go to `ignored`.
fn sanitize_props(
    kind: Option<FieldType>,
    props: Value,
    ignored: &mut Vec<String>,
) -> Map<String, Value> {
    let mut map = match props {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            ignored.push("props".into());
            Map::new()
        }
    };

    if let Some(required) = map.get_mut("required")
        && !required.is_boolean()
    {
        *required = Value::Bool(!is_falsy(required));
    }
    for key in TEXT_PROPS {
        keep_if(&mut map, key, Value::is_string, ignored);
    }
    keep_if(&mut map, "choices", Value::is_array, ignored);
    match kind {
        Some(FieldType::Slider) => {
            for key in SLIDER_PROPS {
                keep_if(&mut map, key, Value::is_number, ignored);
            }
        }
        Some(FieldType::Matrix) => {
            for key in MATRIX_PROPS {
                keep_if(&mut map, key, Value::is_array, ignored);
            }
        }
        _ => {}
    }
    map
}

/// Removes `key` when it is null or fails `accepts`; only the latter counts as ignored.
fn keep_if(
    map: &mut Map<String, Value>,
    key: &str,
    accepts: fn(&Value) -> bool,
    ignored: &mut Vec<String>,
) {
    let Some(value) = map.get(key) else {
        return;
    };
    if value.is_null() {
        map.remove(key);
    } else if !accepts(value) {
        map.remove(key);
        ignored.push(key.to_string());
    }
}

fn decode_props<T: DeserializeOwned + Default>(props: Value, ignored: &mut Vec<String>) -> T {
    serde_json::from_value(props).unwrap_or_else(|error| {
        debug!(%error, "props could not be decoded, using defaults");
        ignored.push("props".into());
        T::default()
    })
}

/// Choice labels may arrive as numbers or booleans; they are kept as text.
fn deserialize_labels<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(|items| {
        items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => display_string(other),
            })
            .collect()
    }))
}

fn deserialize_label_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_labels(deserializer)?.unwrap_or_default())
}

/// Wire shape of a field as served by the forms API.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct RawField {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    props: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
}

/// One question of a form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawField", into = "RawField")]
pub struct Field {
    pub id: String,
    pub kind: FieldKind,
    /// Visibility rule; `None` means always visible.
    pub condition: Option<Condition>,
    /// Props dropped at load time because their JSON shape did not fit the type.
    pub ignored_props: Vec<String>,
}

impl Field {
    pub fn new(id: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            kind,
            condition: None,
            ignored_props: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn label(&self) -> &str {
        self.kind.common().label.as_deref().unwrap_or(&self.id)
    }

    pub fn is_required(&self) -> bool {
        self.kind.common().required
    }
}

impl From<RawField> for Field {
    fn from(raw: RawField) -> Self {
        let (kind, ignored_props) = FieldKind::decode(&raw.kind, raw.props);
        for prop in &ignored_props {
            debug!(field_id = %raw.id, prop = %prop, "ignoring malformed prop");
        }
        Field {
            id: raw.id,
            kind,
            condition: raw.condition,
            ignored_props,
        }
    }
}

impl From<Field> for RawField {
    fn from(field: Field) -> Self {
        RawField {
            props: field.kind.props_value(),
            kind: field.kind.tag().to_string(),
            id: field.id,
            condition: field.condition,
        }
    }
}

impl JsonSchema for Field {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        "Field".into()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        RawField::json_schema(generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_types_decode_typed_props() {
        let field: Field = serde_json::from_value(json!({
            "id": "color",
            "type": "combobox",
            "props": { "label": "Color", "required": true, "choices": ["red", "blue", 3] }
        }))
        .expect("deserialize");
        assert_eq!(field.kind.field_type(), Some(FieldType::Combobox));
        assert_eq!(field.label(), "Color");
        assert!(field.is_required());
        assert_eq!(
            field.kind.choices(),
            Some(&["red".to_string(), "blue".to_string(), "3".to_string()][..])
        );
    }

    #[test]
    fn number_input_type_selects_numeric_semantics() {
        let field: Field = serde_json::from_value(json!({
            "id": "age",
            "type": "short_text",
            "props": { "inputType": "number" }
        }))
        .expect("deserialize");
        assert!(field.kind.is_numeric());

        let slider: Field =
            serde_json::from_value(json!({ "id": "s", "type": "slider" })).expect("deserialize");
        assert!(slider.kind.is_numeric());
    }

    #[test]
    fn unmodelled_types_keep_their_props() {
        let field: Field = serde_json::from_value(json!({
            "id": "rating",
            "type": "star_rating",
            "props": { "stars": 5, "choices": ["low", "high"] }
        }))
        .expect("deserialize");
        assert_eq!(field.kind.tag(), "star_rating");
        assert!(field.kind.field_type().is_none());
        assert_eq!(field.kind.choices().map(<[String]>::len), Some(2));

        let encoded = serde_json::to_value(&field).expect("serialize");
        assert_eq!(encoded["type"], "star_rating");
        assert_eq!(encoded["props"]["stars"], 5);
    }

    #[test]
    fn malformed_props_are_dropped_not_rejected() {
        let field: Field = serde_json::from_value(json!({
            "id": "s",
            "type": "slider",
            "props": {
                "label": 7,
                "required": null,
                "inputType": 5,
                "min": "low",
                "max": 10,
                "choices": "a,b"
            }
        }))
        .expect("lenient decode");
        assert_eq!(field.label(), "s");
        assert!(!field.is_required());
        assert_eq!(field.kind.input_type(), None);
        assert_eq!(field.kind.choices(), None);
        let FieldKind::Slider(props) = &field.kind else {
            panic!("expected slider, got {:?}", field.kind);
        };
        assert_eq!(props.min, None);
        assert_eq!(props.max, Some(10.0));
        assert_eq!(field.ignored_props, vec!["label", "inputType", "choices", "min"]);
    }

    #[test]
    fn required_is_coerced_by_truthiness() {
        let decode = |required: Value| {
            serde_json::from_value::<Field>(json!({
                "id": "q",
                "type": "short_text",
                "props": { "required": required }
            }))
            .expect("deserialize")
        };
        assert!(decode(json!("yes")).is_required());
        assert!(decode(json!(1)).is_required());
        assert!(!decode(json!(0)).is_required());
        assert!(!decode(json!("")).is_required());
        assert!(decode(json!(1)).ignored_props.is_empty());
    }

    #[test]
    fn non_object_props_fall_back_to_defaults() {
        let field: Field = serde_json::from_value(json!({
            "id": "grid",
            "type": "matrix",
            "props": ["rows"]
        }))
        .expect("deserialize");
        assert_eq!(field.kind.field_type(), Some(FieldType::Matrix));
        assert_eq!(field.ignored_props, vec!["props"]);

        let field: Field = serde_json::from_value(json!({
            "id": "grid",
            "type": "matrix",
            "props": { "rows": ["a", 2], "columns": null }
        }))
        .expect("deserialize");
        let FieldKind::Matrix(props) = &field.kind else {
            panic!("expected matrix, got {:?}", field.kind);
        };
        assert_eq!(props.rows, vec!["a", "2"]);
        assert!(props.columns.is_empty());
        assert!(field.ignored_props.is_empty());
    }

    #[test]
    fn text_types_keep_choices() {
        let field: Field = serde_json::from_value(json!({
            "id": "c",
            "type": "short_text",
            "props": { "choices": ["Evet", "Hayır"] }
        }))
        .expect("deserialize");
        assert_eq!(field.kind.choices().map(<[String]>::len), Some(2));
        let encoded = serde_json::to_value(&field).expect("serialize");
        assert_eq!(encoded["props"]["choices"], json!(["Evet", "Hayır"]));
    }
}
