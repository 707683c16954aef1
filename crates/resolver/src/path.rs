//! Parses and traverses the `path` portion of a reference expression.

use serde_json::Value;

/// One segment of a reference path: a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// `.name`
    Field(String),
    /// `[i]`
    Index(usize),
}

/// Parse `"output.items[2].name"` into `[Field(output), Field(items), Index(2), Field(name)]`.
///
/// An empty path parses to an empty segment list (the reference resolves to
/// the whole prior result).
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, String> {
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    for field in path.split('.') {
        if field.is_empty() {
            return Err(format!("empty path segment in `{path}`"));
        }
        let mut rest = field;
        // Leading field name before any `[`.
        if let Some(bracket_pos) = rest.find('[') {
            let name = &rest[..bracket_pos];
            if !name.is_empty() {
                segments.push(PathSegment::Field(name.to_string()));
            }
            rest = &rest[bracket_pos..];
            while !rest.is_empty() {
                if !rest.starts_with('[') {
                    return Err(format!("malformed index expression in `{path}`"));
                }
                let close = rest.find(']').ok_or_else(|| format!("unterminated `[` in `{path}`"))?;
                let idx_str = &rest[1..close];
                let idx: usize = idx_str
                    .parse()
                    .map_err(|_| format!("invalid array index `{idx_str}` in `{path}`"))?;
                segments.push(PathSegment::Index(idx));
                rest = &rest[close + 1..];
            }
        } else {
            segments.push(PathSegment::Field(rest.to_string()));
        }
    }
    Ok(segments)
}

/// Traverse `root` along `segments`.
///
/// Traversal errors per spec §4.1: missing property, null intermediate,
/// array out-of-bounds, and property access on a primitive all fail.
/// `""`, `false`, and `0` are valid terminal values and pass through
/// unchanged — this function does not special-case them, it simply never
/// rejects a value based on falsiness.
pub fn traverse<'a>(root: &'a Value, segments: &[PathSegment]) -> Result<&'a Value, String> {
    let mut current = root;
    let mut walked = String::new();
    for segment in segments {
        match (current, segment) {
            (Value::Null, _) => {
                return Err(format!("cannot access `{segment_display}` on null at `{walked}`", segment_display = display_segment(segment)));
            }
            (Value::Object(map), PathSegment::Field(name)) => {
                current = map.get(name).ok_or_else(|| format!("missing property `{name}` at `{walked}`"))?;
                walked.push('.');
                walked.push_str(name);
            }
            (Value::Array(arr), PathSegment::Index(idx)) => {
                current = arr
                    .get(*idx)
                    .ok_or_else(|| format!("array index {idx} out of bounds (len {}) at `{walked}`", arr.len()))?;
                walked.push_str(&format!("[{idx}]"));
            }
            (other, segment) => {
                return Err(format!(
                    "cannot access `{}` on {} at `{walked}`",
                    display_segment(segment),
                    json_kind(other)
                ));
            }
        }
    }
    Ok(current)
}

fn display_segment(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Field(name) => name.clone(),
        PathSegment::Index(idx) => format!("[{idx}]"),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_simple_dotted_path() {
        let segs = parse_path("output.id").unwrap();
        assert_eq!(segs, vec![PathSegment::Field("output".into()), PathSegment::Field("id".into())]);
    }

    #[test]
    fn parses_index_segments() {
        let segs = parse_path("items[2].name").unwrap();
        assert_eq!(
            segs,
            vec![PathSegment::Field("items".into()), PathSegment::Index(2), PathSegment::Field("name".into())]
        );
    }

    #[test]
    fn parses_leading_bracket_with_no_preceding_field() {
        let segs = parse_path("[0].name").unwrap();
        assert_eq!(segs, vec![PathSegment::Index(0), PathSegment::Field("name".into())]);
    }

    #[test]
    fn empty_path_resolves_to_whole_value() {
        let root = json!({ "id": "123" });
        let result = traverse(&root, &parse_path("").unwrap()).unwrap();
        assert_eq!(result, &root);
    }

    #[test]
    fn traverse_missing_property_fails() {
        let root = json!({ "id": "123" });
        let err = traverse(&root, &parse_path("name").unwrap()).unwrap_err();
        assert!(err.contains("missing property"));
    }

    #[test]
    fn traverse_null_intermediate_fails() {
        let root = json!({ "user": null });
        let err = traverse(&root, &parse_path("user.id").unwrap()).unwrap_err();
        assert!(err.contains("null"));
    }

    #[test]
    fn traverse_array_out_of_bounds_fails() {
        let root = json!({ "items": ["a", "b"] });
        let err = traverse(&root, &parse_path("items[5]").unwrap()).unwrap_err();
        assert!(err.contains("out of bounds"));
    }

    #[test]
    fn traverse_array_index_equal_to_len_minus_one_succeeds() {
        let root = json!({ "items": ["a", "b"] });
        let result = traverse(&root, &parse_path("items[1]").unwrap()).unwrap();
        assert_eq!(result, &json!("b"));
    }

    #[test]
    fn traverse_property_on_primitive_fails() {
        let root = json!({ "id": 42 });
        let err = traverse(&root, &parse_path("id.sub").unwrap()).unwrap_err();
        assert!(err.contains("number"));
    }

    #[test]
    fn falsy_values_pass_through_unchanged() {
        let root = json!({ "empty": "", "flag": false, "count": 0 });
        assert_eq!(traverse(&root, &parse_path("empty").unwrap()).unwrap(), &json!(""));
        assert_eq!(traverse(&root, &parse_path("flag").unwrap()).unwrap(), &json!(false));
        assert_eq!(traverse(&root, &parse_path("count").unwrap()).unwrap(), &json!(0));
    }
}
