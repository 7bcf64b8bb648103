use std::borrow::Cow;

use serde_json::Value;
use tracing::trace;

use crate::answers::{
    answer_for, display_string, is_date, is_empty_answer, is_time, resolve_choices,
    to_number_or_nan,
};
use crate::spec::{Condition, ConditionOperator, FormSchema};

/// Decides whether `condition` holds for the current answers.
///
/// Never fails: a missing condition or controlling field id is satisfied, and
/// malformed input degrades to a deterministic `true`/`false`. Only the
/// controlling field's answer is read; its own visibility is not consulted.
pub fn evaluate(condition: Option<&Condition>, answers: &Value, schema: &FormSchema) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    let Some(field_id) = condition.controlling_field() else {
        return true;
    };

    let result = evaluate_answer(condition, field_id, answer_for(answers, field_id), schema);
    trace!(
        field_id,
        operator = %condition.operator,
        result,
        "condition evaluated"
    );
    result
}

fn evaluate_answer(
    condition: &Condition,
    field_id: &str,
    answer: Option<&Value>,
    schema: &FormSchema,
) -> bool {
    let operator = &condition.operator;
    let empty = is_empty_answer(answer);

    match operator {
        ConditionOperator::IsSet => return !empty,
        ConditionOperator::IsEmpty => return empty,
        _ => {}
    }

    let Some(answer) = answer.filter(|_| !empty) else {
        return false;
    };

    match operator {
        ConditionOperator::IsTrue => {
            return matches!(answer, Value::Bool(true)) || answer.as_str() == Some("true");
        }
        ConditionOperator::IsFalse => {
            return matches!(answer, Value::Bool(false)) || answer.as_str() == Some("false");
        }
        _ => {}
    }

    let controlling = schema.field(field_id);

    if controlling.is_some_and(|field| field.kind.is_numeric()) {
        return compare_numbers(operator, answer, &condition.value);
    }

    let answer = match controlling.and_then(|field| field.kind.choices()) {
        Some(choices) => resolve_choices(answer, choices),
        None => Cow::Borrowed(answer),
    };

    if let Value::Array(items) = answer.as_ref() {
        return compare_membership(operator, items, &condition.value);
    }

    let text = display_string(&answer);
    let target = display_string(&condition.value);
    if is_date(&text) || is_time(&text) {
        return compare_temporal(operator, &text, &target);
    }

    compare_text(operator, &text, &target)
}

fn compare_numbers(operator: &ConditionOperator, answer: &Value, target: &Value) -> bool {
    let answer = to_number_or_nan(answer);
    let target = to_number_or_nan(target);
    match operator {
        ConditionOperator::Equals => answer == target,
        ConditionOperator::NotEquals => answer != target,
        ConditionOperator::GreaterThan => answer > target,
        ConditionOperator::LessThan => answer < target,
        _ => false,
    }
}

fn compare_membership(operator: &ConditionOperator, items: &[Value], target: &Value) -> bool {
    let target = display_string(target);
    let member = items.iter().any(|item| display_string(item) == target);
    match operator {
        ConditionOperator::Equals => member,
        ConditionOperator::NotEquals => !member,
        _ => false,
    }
}

// Both shapes are fixed-width and zero-padded, so string order is time order.
fn compare_temporal(operator: &ConditionOperator, answer: &str, target: &str) -> bool {
    match operator {
        ConditionOperator::Equals => answer == target,
        ConditionOperator::NotEquals => answer != target,
        ConditionOperator::Before => answer < target,
        ConditionOperator::After => answer > target,
        _ => false,
    }
}

fn compare_text(operator: &ConditionOperator, answer: &str, target: &str) -> bool {
    let answer = answer.to_lowercase();
    let target = target.to_lowercase();
    match operator {
        ConditionOperator::Equals => answer == target,
        ConditionOperator::NotEquals => answer != target,
        ConditionOperator::Contains => answer.contains(&target),
        ConditionOperator::StartsWith => answer.starts_with(&target),
        ConditionOperator::EndsWith => answer.ends_with(&target),
        // Unhandled operators do not hide text fields.
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{BasicProps, CommonProps, Field, FieldKind, SliderProps};
    use serde_json::json;

    fn schema() -> FormSchema {
        FormSchema::new(vec![
            Field::new("slider", FieldKind::Slider(SliderProps::default())),
            Field::new(
                "age",
                FieldKind::ShortText(BasicProps {
                    common: CommonProps {
                        input_type: Some("number".into()),
                        ..CommonProps::default()
                    },
                }),
            ),
            Field::new(
                "pick",
                FieldKind::MultiChoice(BasicProps {
                    common: CommonProps {
                        choices: Some(vec!["red".into(), "green".into(), "blue".into()]),
                        ..CommonProps::default()
                    },
                }),
            ),
            Field::new("text", FieldKind::ShortText(BasicProps::default())),
        ])
    }

    fn check(field: &str, operator: &str, value: Value, answer: Value) -> bool {
        let condition = Condition::new(field, operator, value);
        evaluate(Some(&condition), &json!({ field: answer }), &schema())
    }

    #[test]
    fn missing_condition_or_field_id_is_satisfied() {
        assert!(evaluate(None, &json!({}), &schema()));
        let condition = Condition {
            field_id: None,
            operator: ConditionOperator::Equals,
            value: json!("x"),
        };
        assert!(evaluate(Some(&condition), &json!({}), &schema()));
    }

    #[test]
    fn boolean_checks_accept_bools_and_strings() {
        assert!(check("text", "is_true", Value::Null, json!(true)));
        assert!(check("text", "is_true", Value::Null, json!("true")));
        assert!(!check("text", "is_true", Value::Null, json!("yes")));
        assert!(check("text", "is_false", Value::Null, json!(false)));
        assert!(check("text", "is_false", Value::Null, json!("false")));
        assert!(!check("text", "is_false", Value::Null, json!(0)));
    }

    #[test]
    fn numeric_input_type_compares_numbers() {
        assert!(check("age", "greater_than", json!("18"), json!("21")));
        assert!(check("age", "less_than", json!(18), json!(9)));
        assert!(check("age", "equals", json!("10"), json!(10.0)));
        assert!(!check("age", "greater_than", json!(18), json!("abc")));
        assert!(check("age", "not_equals", json!(18), json!("abc")));
        assert!(!check("age", "contains", json!("1"), json!("15")));
        assert!(!check("age", "before", json!("2"), json!("1")));
    }

    #[test]
    fn list_answers_use_membership_after_index_resolution() {
        assert!(check("pick", "equals", json!("green"), json!(["1"])));
        assert!(check("pick", "equals", json!("blue"), json!([2, "red"])));
        assert!(!check("pick", "not_equals", json!("red"), json!([0])));
        assert!(!check("pick", "contains", json!("red"), json!(["red"])));
    }

    #[test]
    fn temporal_answers_compare_lexically() {
        assert!(check("text", "before", json!("10:30"), json!("09:15")));
        assert!(!check("text", "after", json!("10:30"), json!("09:15")));
        assert!(check("text", "equals", json!("2024-01-01"), json!("2024-01-01")));
        assert!(!check("text", "contains", json!("2024"), json!("2024-01-01")));
    }

    #[test]
    fn text_answers_fold_case() {
        assert!(check("text", "equals", json!("ANKARA"), json!("ankara")));
        assert!(check("text", "starts_with", json!("an"), json!("Ankara")));
        assert!(check("text", "ends_with", json!("RA"), json!("Ankara")));
        assert!(!check("text", "not_equals", json!("Ankara"), json!("ANKARA")));
    }

    #[test]
    fn fallbacks_are_permissive_only_for_text() {
        assert!(check("text", "greater_than", json!(5), json!("anything")));
        assert!(check("text", "between", json!(5), json!("anything")));
        assert!(!check("slider", "between", json!(5), json!(7)));
        assert!(!check("pick", "between", json!("red"), json!(["red"])));
        assert!(!check("text", "between", json!("x"), json!("2024-01-01")));
    }

    #[test]
    fn unknown_controlling_field_uses_text_path() {
        let condition = Condition::new("ghost", "greater_than", json!(10));
        assert!(evaluate(Some(&condition), &json!({ "ghost": "5" }), &schema()));
        let condition = Condition::new("ghost", "equals", json!("Evet"));
        assert!(!evaluate(Some(&condition), &json!({ "ghost": "0" }), &schema()));
    }
}
