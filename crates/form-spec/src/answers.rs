use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern"));
static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{2}:[0-9]{2}$").expect("time pattern"));
static INDEX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("index pattern"));

/// Borrowed view over a single answer, classified by shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer<'a> {
    Missing,
    Scalar(&'a Value),
    List(&'a [Value]),
    Matrix(&'a Map<String, Value>),
}

impl<'a> Answer<'a> {
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            None | Some(Value::Null) => Answer::Missing,
            Some(Value::Array(items)) => Answer::List(items),
            Some(Value::Object(map)) => Answer::Matrix(map),
            Some(other) => Answer::Scalar(other),
        }
    }
}

/// Looks up the answer recorded for `field_id`. Non-object answer maps hold nothing.
pub fn answer_for<'a>(answers: &'a Value, field_id: &str) -> Option<&'a Value> {
    answers.as_object().and_then(|map| map.get(field_id))
}

/// Falsy in the loose sense the form host uses: null, false, zero, NaN and "".
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64().is_none_or(|n| n == 0.0 || n.is_nan()),
        Value::String(text) => text.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// An answer is empty when it is missing, null, "", an empty list, or an
/// object whose values are all falsy.
pub fn is_empty_answer(value: Option<&Value>) -> bool {
    match Answer::classify(value) {
        Answer::Missing => true,
        Answer::Scalar(Value::String(text)) => text.is_empty(),
        Answer::Scalar(_) => false,
        Answer::List(items) => items.is_empty(),
        Answer::Matrix(map) => map.values().all(is_falsy),
    }
}

/// Numeric coercion with loose host semantics; anything unparseable is NaN.
pub fn to_number_or_nan(value: &Value) -> f64 {
    match value {
        Value::Null | Value::Object(_) => f64::NAN,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_number(text),
        Value::Array(_) => parse_number(&display_string(value)),
    }
}

fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // f64::from_str also accepts "inf" and "nan" spellings, which are not numbers here.
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// String form of an answer or operand, as the form host would print it.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => display_number(number),
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(display_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn display_number(number: &serde_json::Number) -> String {
    if number.is_i64() || number.is_u64() {
        return number.to_string();
    }
    match number.as_f64() {
        Some(n) if n.fract() == 0.0 && n.abs() < 1e21 => format!("{n:.0}"),
        Some(n) => n.to_string(),
        None => number.to_string(),
    }
}

pub fn is_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
}

pub fn is_time(text: &str) -> bool {
    TIME_PATTERN.is_match(text)
}

/// Zero-based choice index carried by a numeric-looking value.
pub fn choice_index(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|n| *n >= 0.0 && n.fract() == 0.0)
                    .map(|n| n as u64)
            })
            .and_then(|n| usize::try_from(n).ok()),
        Value::String(text) if INDEX_PATTERN.is_match(text) => text.parse().ok(),
        _ => None,
    }
}

/// Replaces numeric-looking values (or list elements) with the choice label
/// they index. Out-of-range indices and labels are kept as given.
pub fn resolve_choices<'a>(value: &'a Value, choices: &[String]) -> Cow<'a, Value> {
    match value {
        Value::Array(items) => Cow::Owned(Value::Array(
            items
                .iter()
                .map(|item| resolve_choice(item, choices).into_owned())
                .collect(),
        )),
        other => resolve_choice(other, choices),
    }
}

fn resolve_choice<'a>(value: &'a Value, choices: &[String]) -> Cow<'a, Value> {
    match choice_index(value).and_then(|index| choices.get(index)) {
        Some(label) => Cow::Owned(Value::String(label.clone())),
        None => Cow::Borrowed(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_answers_follow_host_rules() {
        assert!(is_empty_answer(None));
        assert!(is_empty_answer(Some(&Value::Null)));
        assert!(is_empty_answer(Some(&json!(""))));
        assert!(is_empty_answer(Some(&json!([]))));
        assert!(is_empty_answer(Some(&json!({}))));
        assert!(is_empty_answer(Some(&json!({ "row1": "", "row2": 0, "row3": false }))));

        assert!(!is_empty_answer(Some(&json!(" "))));
        assert!(!is_empty_answer(Some(&json!(0))));
        assert!(!is_empty_answer(Some(&json!(false))));
        assert!(!is_empty_answer(Some(&json!([""]))));
        assert!(!is_empty_answer(Some(&json!({ "row1": "", "row2": "b" }))));
    }

    #[test]
    fn numbers_coerce_loosely() {
        assert_eq!(to_number_or_nan(&json!("15")), 15.0);
        assert_eq!(to_number_or_nan(&json!(" 2.5 ")), 2.5);
        assert_eq!(to_number_or_nan(&json!("")), 0.0);
        assert_eq!(to_number_or_nan(&json!("0x10")), 16.0);
        assert_eq!(to_number_or_nan(&json!("1e3")), 1000.0);
        assert_eq!(to_number_or_nan(&json!(true)), 1.0);
        assert_eq!(to_number_or_nan(&json!(["7"])), 7.0);
        assert_eq!(to_number_or_nan(&json!([])), 0.0);
        assert_eq!(to_number_or_nan(&json!("-Infinity")), f64::NEG_INFINITY);

        assert!(to_number_or_nan(&json!("abc")).is_nan());
        assert!(to_number_or_nan(&json!("inf")).is_nan());
        assert!(to_number_or_nan(&json!("NaN")).is_nan());
        assert!(to_number_or_nan(&json!([1, 2])).is_nan());
        assert!(to_number_or_nan(&json!({ "a": 1 })).is_nan());
        assert!(to_number_or_nan(&Value::Null).is_nan());
    }

    #[test]
    fn display_strings_match_host_printing() {
        assert_eq!(display_string(&json!(10)), "10");
        assert_eq!(display_string(&json!(10.0)), "10");
        assert_eq!(display_string(&json!(1.5)), "1.5");
        assert_eq!(display_string(&json!(["a", 1, null])), "a,1,");
        assert_eq!(display_string(&json!({ "k": "v" })), "[object Object]");
        assert_eq!(display_string(&Value::Null), "");
    }

    #[test]
    fn choice_indices_resolve_to_labels() {
        let choices = vec!["Evet".to_string(), "Hayır".to_string()];
        assert_eq!(resolve_choices(&json!("0"), &choices).as_ref(), &json!("Evet"));
        assert_eq!(resolve_choices(&json!(1), &choices).as_ref(), &json!("Hayır"));
        assert_eq!(resolve_choices(&json!("5"), &choices).as_ref(), &json!("5"));
        assert_eq!(resolve_choices(&json!("-1"), &choices).as_ref(), &json!("-1"));
        assert_eq!(
            resolve_choices(&json!(["1", "Evet", 9]), &choices).as_ref(),
            &json!(["Hayır", "Evet", 9])
        );
    }

    #[test]
    fn temporal_patterns_are_fixed_width() {
        assert!(is_date("2024-06-15"));
        assert!(!is_date("2024-6-15"));
        assert!(!is_date("2024-06-15T10:00"));
        assert!(is_time("09:30"));
        assert!(!is_time("9:30"));
        assert!(!is_time("09:30:00"));
    }
}
