//! Recursive schema evaluator over untyped [`serde_json::Value`] documents.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::{validate_format, SUPPORTED_FORMATS};

/// A parsed (but not pre-compiled) JSON-Schema document.
///
/// Kept as a thin wrapper around the raw [`serde_json::Value`] rather than
/// a typed struct: schemas are author-supplied data, not Rust types, and
/// the constrained dialect is interpreted structurally at validation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema(Value);

impl Schema {
    /// Wrap a schema document.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a schema document from a JSON string.
    pub fn from_str(s: &str) -> Result<Self, serde_json::Error> {
        Ok(Self(serde_json::from_str(s)?))
    }

    /// Borrow the underlying JSON document.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

/// One validation failure, anchored to the dotted path of the offending node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Dotted path into the validated document (e.g. `$.user.emails[2]`).
    pub path: String,
    /// Human-readable failure description.
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self { path: path.to_string(), message: message.into() }
    }
}

/// Result of validating a value against a [`Schema`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// All collected validation errors, not just the first.
    pub errors: Vec<ValidationError>,
}

/// Validate `value` against `schema`, collecting every error rather than
/// stopping at the first (spec §4.2 output contract).
#[must_use]
pub fn validate(schema: &Schema, value: &Value) -> ValidationOutcome {
    let mut errors = Vec::new();
    validate_node(&schema.0, value, "$", &mut errors);
    ValidationOutcome { valid: errors.is_empty(), errors }
}

const RECOGNIZED_TOP_LEVEL_KEYWORDS: &[&str] = &["type", "anyOf", "oneOf", "allOf", "const", "enum"];

fn validate_node(schema: &Value, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(obj) = schema.as_object() else {
        errors.push(ValidationError::new(path, "schema node must be a JSON object"));
        return;
    };

    // Hard rule (spec §4.2): a schema node without any recognized anchor
    // keyword is a validation error, never a silent pass.
    if !RECOGNIZED_TOP_LEVEL_KEYWORDS.iter().any(|k| obj.contains_key(*k)) {
        errors.push(ValidationError::new(
            path,
            "schema has none of type/anyOf/oneOf/allOf/const/enum",
        ));
        return;
    }

    if let Some(const_val) = obj.get("const") {
        if value != const_val {
            errors.push(ValidationError::new(path, format!("expected const value {const_val}")));
        }
    }

    if let Some(enum_vals) = obj.get("enum") {
        match enum_vals.as_array() {
            Some(arr) if !arr.contains(value) => {
                errors.push(ValidationError::new(path, "value is not one of the allowed enum values"));
            }
            None if !enum_vals.is_null() => {
                errors.push(ValidationError::new(path, "`enum` must be an array"));
            }
            _ => {}
        }
    }

    if let Some(type_val) = obj.get("type") {
        validate_type(type_val, value, path, errors);
    }

    // format is only meaningful on strings, but an unrecognized format name
    // is an error regardless of the value's shape.
    if let Some(format_val) = obj.get("format") {
        match format_val.as_str() {
            Some(format_name) => {
                if !SUPPORTED_FORMATS.contains(&format_name) {
                    errors.push(ValidationError::new(path, format!("unrecognized format `{format_name}`")));
                } else if let Some(s) = value.as_str() {
                    if let Err(msg) = validate_format(format_name, s) {
                        errors.push(ValidationError::new(path, msg));
                    }
                }
            }
            None => errors.push(ValidationError::new(path, "`format` must be a string")),
        }
    }

    match value {
        Value::Object(map) => validate_object(obj, map, path, errors),
        Value::Array(arr) => validate_array(obj, arr, path, errors),
        Value::Number(n) => validate_number(obj, n, path, errors),
        Value::String(s) => validate_string(obj, s, path, errors),
        _ => {}
    }

    if let Some(any_of) = obj.get("anyOf") {
        validate_union(any_of, "anyOf", value, path, errors);
    }
    if let Some(one_of) = obj.get("oneOf") {
        validate_one_of(one_of, value, path, errors);
    }
    if let Some(all_of) = obj.get("allOf") {
        match all_of.as_array() {
            Some(subs) => {
                for sub in subs {
                    validate_node(sub, value, path, errors);
                }
            }
            None => errors.push(ValidationError::new(path, "`allOf` must be an array of schemas")),
        }
    }
}

fn validate_union(keyword_val: &Value, keyword: &str, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(subs) = keyword_val.as_array() else {
        errors.push(ValidationError::new(path, format!("`{keyword}` must be an array of schemas")));
        return;
    };
    if subs.is_empty() {
        errors.push(ValidationError::new(path, format!("`{keyword}` must not be empty")));
        return;
    }
    let any_matches = subs.iter().any(|sub| {
        let mut sub_errors = Vec::new();
        validate_node(sub, value, path, &mut sub_errors);
        sub_errors.is_empty()
    });
    if !any_matches {
        errors.push(ValidationError::new(
            path,
            format!("value does not match any schema in `{keyword}`"),
        ));
    }
}

/// `oneOf` requires the value to match exactly one subschema, unlike
/// `anyOf`'s at-least-one semantics (spec §4.2).
fn validate_one_of(keyword_val: &Value, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(subs) = keyword_val.as_array() else {
        errors.push(ValidationError::new(path, "`oneOf` must be an array of schemas"));
        return;
    };
    if subs.is_empty() {
        errors.push(ValidationError::new(path, "`oneOf` must not be empty"));
        return;
    }
    let match_count = subs
        .iter()
        .filter(|sub| {
            let mut sub_errors = Vec::new();
            validate_node(sub, value, path, &mut sub_errors);
            sub_errors.is_empty()
        })
        .count();
    if match_count != 1 {
        errors.push(ValidationError::new(
            path,
            format!("value must match exactly one schema in `oneOf`, matched {match_count}"),
        ));
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    let actual = json_type_name(value);
    actual == expected || (expected == "number" && actual == "integer")
}

fn validate_type(type_val: &Value, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
    match type_val {
        Value::String(expected) => {
            if !type_matches(expected, value) {
                errors.push(ValidationError::new(
                    path,
                    format!("expected type `{expected}`, got `{}`", json_type_name(value)),
                ));
            }
        }
        Value::Array(candidates) => {
            let names: Vec<&str> = candidates.iter().filter_map(Value::as_str).collect();
            if names.len() != candidates.len() {
                errors.push(ValidationError::new(path, "`type` array must contain only strings"));
                return;
            }
            if !names.iter().any(|t| type_matches(t, value)) {
                errors.push(ValidationError::new(
                    path,
                    format!("expected one of types {names:?}, got `{}`", json_type_name(value)),
                ));
            }
        }
        _ => errors.push(ValidationError::new(path, "`type` must be a string or array of strings")),
    }
}

fn validate_object(
    obj: &serde_json::Map<String, Value>,
    map: &serde_json::Map<String, Value>,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if let Some(required) = obj.get("required").and_then(Value::as_array) {
        for req in required {
            if let Some(key) = req.as_str() {
                if !map.contains_key(key) {
                    errors.push(ValidationError::new(path, format!("missing required property `{key}`")));
                }
            }
        }
    }

    let properties = obj.get("properties").and_then(Value::as_object);

    if let Some(props) = properties {
        for (key, sub_schema) in props {
            if let Some(sub_value) = map.get(key) {
                let child_path = format!("{path}.{key}");
                validate_node(sub_schema, sub_value, &child_path, errors);
            }
        }
    }

    if let Some(Value::Bool(false)) = obj.get("additionalProperties") {
        let known: std::collections::HashSet<&str> =
            properties.map(|p| p.keys().map(String::as_str).collect()).unwrap_or_default();
        for key in map.keys() {
            if !known.contains(key.as_str()) {
                errors.push(ValidationError::new(path, format!("unexpected additional property `{key}`")));
            }
        }
    } else if let Some(schema) = obj.get("additionalProperties").filter(|v| !v.is_boolean()) {
        let known: std::collections::HashSet<&str> =
            properties.map(|p| p.keys().map(String::as_str).collect()).unwrap_or_default();
        for (key, sub_value) in map {
            if !known.contains(key.as_str()) {
                let child_path = format!("{path}.{key}");
                validate_node(schema, sub_value, &child_path, errors);
            }
        }
    }
}

fn validate_array(obj: &serde_json::Map<String, Value>, arr: &[Value], path: &str, errors: &mut Vec<ValidationError>) {
    if let Some(min) = obj.get("minItems").and_then(Value::as_u64) {
        if (arr.len() as u64) < min {
            errors.push(ValidationError::new(path, format!("array has {} items, expected at least {min}", arr.len())));
        }
    }
    if let Some(max) = obj.get("maxItems").and_then(Value::as_u64) {
        if (arr.len() as u64) > max {
            errors.push(ValidationError::new(path, format!("array has {} items, expected at most {max}", arr.len())));
        }
    }
    if obj.get("uniqueItems").and_then(Value::as_bool) == Some(true) {
        let mut seen: Vec<&Value> = Vec::new();
        for item in arr {
            if seen.contains(&item) {
                errors.push(ValidationError::new(path, "array items must be unique"));
                break;
            }
            seen.push(item);
        }
    }
    if let Some(item_schema) = obj.get("items") {
        for (i, item) in arr.iter().enumerate() {
            let child_path = format!("{path}[{i}]");
            validate_node(item_schema, item, &child_path, errors);
        }
    }
}

fn validate_number(obj: &serde_json::Map<String, Value>, n: &serde_json::Number, path: &str, errors: &mut Vec<ValidationError>) {
    let Some(num) = n.as_f64() else {
        errors.push(ValidationError::new(path, "number is not representable as f64"));
        return;
    };

    if let Some(min) = obj.get("minimum").and_then(Value::as_f64) {
        if num < min {
            errors.push(ValidationError::new(path, format!("{num} is less than minimum {min}")));
        }
    }
    if let Some(max) = obj.get("maximum").and_then(Value::as_f64) {
        if num > max {
            errors.push(ValidationError::new(path, format!("{num} is greater than maximum {max}")));
        }
    }
    if let Some(ex_min) = obj.get("exclusiveMinimum").and_then(Value::as_f64) {
        if num <= ex_min {
            errors.push(ValidationError::new(path, format!("{num} must be strictly greater than {ex_min}")));
        }
    }
    if let Some(ex_max) = obj.get("exclusiveMaximum").and_then(Value::as_f64) {
        if num >= ex_max {
            errors.push(ValidationError::new(path, format!("{num} must be strictly less than {ex_max}")));
        }
    }
    if let Some(multiple) = obj.get("multipleOf").and_then(Value::as_f64) {
        if multiple > 0.0 {
            let quotient = num / multiple;
            if (quotient - quotient.round()).abs() > f64::EPSILON * quotient.abs().max(1.0) {
                errors.push(ValidationError::new(path, format!("{num} is not a multiple of {multiple}")));
            }
        }
    }
}

fn validate_string(obj: &serde_json::Map<String, Value>, s: &str, path: &str, errors: &mut Vec<ValidationError>) {
    let len = s.chars().count();
    if let Some(min) = obj.get("minLength").and_then(Value::as_u64) {
        if (len as u64) < min {
            errors.push(ValidationError::new(path, format!("string length {len} is less than minLength {min}")));
        }
    }
    if let Some(max) = obj.get("maxLength").and_then(Value::as_u64) {
        if (len as u64) > max {
            errors.push(ValidationError::new(path, format!("string length {len} is greater than maxLength {max}")));
        }
    }
    if let Some(pattern) = obj.get("pattern").and_then(Value::as_str) {
        match Regex::new(pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    errors.push(ValidationError::new(path, format!("string does not match pattern `{pattern}`")));
                }
            }
            Err(e) => errors.push(ValidationError::new(path, format!("invalid `pattern` regex `{pattern}`: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(v: Value) -> Schema {
        Schema::new(v)
    }

    #[test]
    fn basic_type_mismatch_is_reported() {
        let s = schema(json!({ "type": "string" }));
        let outcome = validate(&s, &json!(42));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].path, "$");
    }

    #[test]
    fn required_properties_are_enforced() {
        let s = schema(json!({
            "type": "object",
            "properties": { "id": { "type": "string" } },
            "required": ["id"]
        }));
        let outcome = validate(&s, &json!({}));
        assert!(!outcome.valid);
        assert!(outcome.errors[0].message.contains("id"));
    }

    #[test]
    fn nested_property_errors_carry_dotted_path() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "user": {
                    "type": "object",
                    "properties": { "age": { "type": "number", "minimum": 0 } }
                }
            }
        }));
        let outcome = validate(&s, &json!({ "user": { "age": -5 } }));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].path, "$.user.age");
    }

    #[test]
    fn array_index_appears_in_path() {
        let s = schema(json!({
            "type": "array",
            "items": { "type": "string" }
        }));
        let outcome = validate(&s, &json!(["a", 2, "c"]));
        assert!(!outcome.valid);
        assert_eq!(outcome.errors[0].path, "$[1]");
    }

    #[test]
    fn additional_properties_false_rejects_unknown_keys() {
        let s = schema(json!({
            "type": "object",
            "properties": { "id": { "type": "string" } },
            "additionalProperties": false
        }));
        let outcome = validate(&s, &json!({ "id": "1", "extra": true }));
        assert!(!outcome.valid);
    }

    #[test]
    fn enum_rejects_values_outside_the_set() {
        let s = schema(json!({ "enum": ["a", "b"] }));
        assert!(validate(&s, &json!("a")).valid);
        assert!(!validate(&s, &json!("c")).valid);
    }

    #[test]
    fn const_requires_exact_match() {
        let s = schema(json!({ "const": 42 }));
        assert!(validate(&s, &json!(42)).valid);
        assert!(!validate(&s, &json!(43)).valid);
    }

    #[test]
    fn any_of_passes_if_any_branch_matches() {
        let s = schema(json!({ "anyOf": [{ "type": "string" }, { "type": "number" }] }));
        assert!(validate(&s, &json!("x")).valid);
        assert!(validate(&s, &json!(1)).valid);
        assert!(!validate(&s, &json!(true)).valid);
    }

    #[test]
    fn one_of_rejects_a_value_matching_more_than_one_branch() {
        let s = schema(json!({ "oneOf": [{ "type": "number" }, { "minimum": 0 }] }));
        // 5 matches both sub-schemas, so oneOf must reject it.
        assert!(!validate(&s, &json!(5)).valid);
    }

    #[test]
    fn one_of_accepts_a_value_matching_exactly_one_branch() {
        let s = schema(json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] }));
        assert!(validate(&s, &json!("x")).valid);
        assert!(validate(&s, &json!(1)).valid);
    }

    #[test]
    fn one_of_rejects_a_value_matching_no_branch() {
        let s = schema(json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] }));
        assert!(!validate(&s, &json!(true)).valid);
    }

    #[test]
    fn all_of_requires_every_branch() {
        let s = schema(json!({ "allOf": [{ "type": "number" }, { "minimum": 10 }] }));
        assert!(validate(&s, &json!(15)).valid);
        assert!(!validate(&s, &json!(5)).valid);
    }

    #[test]
    fn unrecognized_format_is_a_hard_error() {
        let s = schema(json!({ "type": "string", "format": "phone-number" }));
        let outcome = validate(&s, &json!("555-1234"));
        assert!(!outcome.valid);
        assert!(outcome.errors.iter().any(|e| e.message.contains("unrecognized format")));
    }

    #[test]
    fn schema_without_any_anchor_keyword_is_an_error() {
        let s = schema(json!({ "description": "nothing useful" }));
        let outcome = validate(&s, &json!("anything"));
        assert!(!outcome.valid);
    }

    #[test]
    fn string_constraints_min_max_pattern() {
        let s = schema(json!({
            "type": "string",
            "minLength": 3,
            "maxLength": 5,
            "pattern": "^[a-z]+$"
        }));
        assert!(validate(&s, &json!("abcd")).valid);
        assert!(!validate(&s, &json!("ab")).valid);
        assert!(!validate(&s, &json!("abcdef")).valid);
        assert!(!validate(&s, &json!("ABCD")).valid);
    }

    #[test]
    fn numeric_exclusive_bounds_and_multiple_of() {
        let s = schema(json!({
            "type": "number",
            "exclusiveMinimum": 0,
            "exclusiveMaximum": 10,
            "multipleOf": 2
        }));
        assert!(validate(&s, &json!(4)).valid);
        assert!(!validate(&s, &json!(0)).valid);
        assert!(!validate(&s, &json!(10)).valid);
        assert!(!validate(&s, &json!(3)).valid);
    }

    #[test]
    fn array_unique_items_enforced() {
        let s = schema(json!({ "type": "array", "uniqueItems": true }));
        assert!(validate(&s, &json!([1, 2, 3])).valid);
        assert!(!validate(&s, &json!([1, 2, 2])).valid);
    }

    #[test]
    fn accumulates_multiple_errors_not_just_the_first() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "number" }
            },
            "required": ["a", "b"]
        }));
        let outcome = validate(&s, &json!({ "a": 1, "b": "x" }));
        assert_eq!(outcome.errors.len(), 2);
    }

    proptest::proptest! {
        #[test]
        fn minlength_maxlength_never_panics(s in ".*", min in 0u64..20, max in 0u64..20) {
            let schema = schema(json!({ "type": "string", "minLength": min, "maxLength": max }));
            let _ = validate(&schema, &json!(s));
        }
    }
}
