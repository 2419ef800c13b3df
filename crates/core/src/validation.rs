//! Structured validation issues and the field-level checks shared by the
//! template and profile validators.
//!
//! Validators walk an untrusted [`serde_json::Value`] and record every
//! problem they find as a [`ValidationIssue`] instead of stopping at the
//! first one, so callers can render per-field diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateUrl;

/// A single problem found while validating untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted field path, e.g. `collections.3.items.1.id`. Empty for the
    /// document root.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<root>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// All issues found in one validation run. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Build an error carrying a single issue.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue::new(path, message)],
        }
    }

    /// Whether any issue was reported at exactly `path`.
    pub fn has_issue_at(&self, path: &str) -> bool {
        self.issues.iter().any(|issue| issue.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Syntactic URL check shared by the schema validators and by callers that
/// accept a template URL from the user.
pub fn is_valid_url(url: &str) -> bool {
    url.validate_url()
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Append a field name or array index to a dotted path.
pub(crate) fn join_path(parent: &str, segment: impl fmt::Display) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

/// JSON type name used in "expected X, received Y" messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expected(kind: &str, value: &Value) -> String {
    format!("Expected {kind}, received {}", type_name(value))
}

// ---------------------------------------------------------------------------
// Issue collector
// ---------------------------------------------------------------------------

/// Accumulates issues while a validator walks a document.
///
/// Each accessor returns `Some` only when the field is well-formed, so the
/// caller can keep descending into valid parts and skip broken ones.
#[derive(Debug, Default)]
pub(crate) struct Issues {
    issues: Vec<ValidationIssue>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                issues: self.issues,
            })
        }
    }

    /// Require `value` to be an object.
    pub fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.push(path, expected("object", other));
                None
            }
        }
    }

    /// Required object field.
    pub fn object_field<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        let value = self.required(obj, field, path)?;
        self.object(value, &join_path(path, field))
    }

    /// Optional object field; `null` is rejected like any other wrong type.
    pub fn optional_object_field<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a Map<String, Value>> {
        let value = obj.get(field)?;
        self.object(value, &join_path(path, field))
    }

    /// Required string field.
    pub fn string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a str> {
        let value = self.required(obj, field, path)?;
        self.as_string(value, &join_path(path, field))
    }

    /// Optional string field.
    pub fn optional_string<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a str> {
        let value = obj.get(field)?;
        self.as_string(value, &join_path(path, field))
    }

    pub fn as_string<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a str> {
        match value {
            Value::String(s) => Some(s),
            other => {
                self.push(path, expected("string", other));
                None
            }
        }
    }

    /// Optional boolean field.
    pub fn optional_bool(&mut self, obj: &Map<String, Value>, field: &str, path: &str) {
        if let Some(value) = obj.get(field) {
            if !value.is_boolean() {
                self.push(join_path(path, field), expected("boolean", value));
            }
        }
    }

    /// Required non-negative integer field.
    pub fn non_negative_int(
        &mut self,
        obj: &Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<u64> {
        let value = self.required(obj, field, path)?;
        match value.as_u64() {
            Some(n) => Some(n),
            None => {
                self.push(
                    join_path(path, field),
                    if value.is_number() {
                        "Expected non-negative integer".to_string()
                    } else {
                        expected("non-negative integer", value)
                    },
                );
                None
            }
        }
    }

    /// Required string field that must equal `literal`.
    pub fn literal_str(&mut self, obj: &Map<String, Value>, field: &str, literal: &str, path: &str) {
        if let Some(value) = self.required(obj, field, path) {
            if value.as_str() != Some(literal) {
                self.push(
                    join_path(path, field),
                    format!("Invalid literal value, expected \"{literal}\""),
                );
            }
        }
    }

    /// Required integer field that must equal `literal`.
    pub fn literal_u64(&mut self, obj: &Map<String, Value>, field: &str, literal: u64, path: &str) {
        if let Some(value) = self.required(obj, field, path) {
            if value.as_u64() != Some(literal) {
                self.push(
                    join_path(path, field),
                    format!("Invalid literal value, expected {literal}"),
                );
            }
        }
    }

    /// Required string field drawn from a fixed set of values.
    pub fn one_of<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        allowed: &[&str],
        path: &str,
    ) -> Option<&'a str> {
        let s = self.string(obj, field, path)?;
        if allowed.contains(&s) {
            Some(s)
        } else {
            self.push(
                join_path(path, field),
                format!("Invalid enum value. Expected one of {allowed:?}, received '{s}'"),
            );
            None
        }
    }

    /// String field that must be a syntactically valid URL.
    pub fn url<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
        required: bool,
    ) -> Option<&'a str> {
        let s = if required {
            self.string(obj, field, path)?
        } else {
            self.optional_string(obj, field, path)?
        };
        if s.validate_url() {
            Some(s)
        } else {
            self.push(join_path(path, field), "Invalid url");
            None
        }
    }

    /// Required array field.
    pub fn array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        let value = self.required(obj, field, path)?;
        self.as_array(value, &join_path(path, field))
    }

    /// Optional array field.
    pub fn optional_array<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a Vec<Value>> {
        let value = obj.get(field)?;
        self.as_array(value, &join_path(path, field))
    }

    pub fn as_array<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Vec<Value>> {
        match value {
            Value::Array(items) => Some(items),
            other => {
                self.push(path, expected("array", other));
                None
            }
        }
    }

    /// Optional array of strings.
    pub fn optional_string_array(&mut self, obj: &Map<String, Value>, field: &str, path: &str) {
        let Some(items) = self.optional_array(obj, field, path) else {
            return;
        };
        let field_path = join_path(path, field);
        for (i, item) in items.iter().enumerate() {
            self.as_string(item, &join_path(&field_path, i));
        }
    }

    fn required<'a>(
        &mut self,
        obj: &'a Map<String, Value>,
        field: &str,
        path: &str,
    ) -> Option<&'a Value> {
        match obj.get(field) {
            Some(value) => Some(value),
            None => {
                self.push(join_path(path, field), "Required");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn join_path_handles_root() {
        assert_eq!(join_path("", "collections"), "collections");
        assert_eq!(join_path("collections", 3), "collections.3");
        assert_eq!(join_path("collections.3.items", 1), "collections.3.items.1");
    }

    #[test]
    fn url_syntax() {
        assert!(is_valid_url("https://example.com/template.json"));
        assert!(!is_valid_url("example.com/template.json"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn missing_field_is_required() {
        let mut issues = Issues::new();
        let data = obj(json!({}));
        assert!(issues.string(&data, "id", "members.0").is_none());
        let err = issues.into_result().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::new("members.0.id", "Required")]);
    }

    #[test]
    fn wrong_type_reports_received_type() {
        let mut issues = Issues::new();
        let data = obj(json!({ "name": 5 }));
        issues.string(&data, "name", "");
        let err = issues.into_result().unwrap_err();
        assert_eq!(err.issues[0].path, "name");
        assert_eq!(err.issues[0].message, "Expected string, received number");
    }

    #[test]
    fn negative_and_fractional_numbers_are_not_integers() {
        let mut issues = Issues::new();
        let data = obj(json!({ "a": -1, "b": 1.5, "c": 7 }));
        assert!(issues.non_negative_int(&data, "a", "").is_none());
        assert!(issues.non_negative_int(&data, "b", "").is_none());
        assert_eq!(issues.non_negative_int(&data, "c", ""), Some(7));
        assert_eq!(issues.into_result().unwrap_err().issues.len(), 2);
    }

    #[test]
    fn url_field_rejects_garbage() {
        let mut issues = Issues::new();
        let data = obj(json!({ "link": "not a url", "ok": "https://example.com/t.json" }));
        assert!(issues.url(&data, "link", "", true).is_none());
        assert!(issues.url(&data, "ok", "", true).is_some());
        assert!(issues.url(&data, "absent", "", false).is_none());
        let err = issues.into_result().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::new("link", "Invalid url")]);
    }

    #[test]
    fn enum_field_lists_allowed_values() {
        let mut issues = Issues::new();
        let data = obj(json!({ "format": "gif" }));
        assert!(issues.one_of(&data, "format", &["jpg", "png"], "imageBaseUrl").is_none());
        let err = issues.into_result().unwrap_err();
        assert!(err.has_issue_at("imageBaseUrl.format"));
    }

    #[test]
    fn display_joins_issues_by_line() {
        let err = ValidationError {
            issues: vec![
                ValidationIssue::new("", "Expected object, received array"),
                ValidationIssue::new("id", "Required"),
            ],
        };
        assert_eq!(
            err.to_string(),
            "<root>: Expected object, received array\nid: Required"
        );
    }
}
