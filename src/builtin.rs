//! Built-in checks
//!
//! Registered under their names by [`register`], so declaration documents can
//! refer to them without any code:
//!
//! | name           | applies to              | arguments                 |
//! |----------------|-------------------------|---------------------------|
//! | `not_empty`    | strings, lists, objects | none                      |
//! | `length`       | strings, lists          | `min`, `max`              |
//! | `range`        | numbers                 | `min`, `max`              |
//! | `pattern`      | strings                 | `regex`                   |
//! | `one_of`       | any                     | `values`                  |
//! | `equal_fields` | objects (invariants)    | `fields`, `message`       |
//!
//! Values a check does not apply to pass; type mismatches are reported by the
//! field's type, which runs first.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::check::{Check, CheckArgs};
use crate::schema::Schema;

/// Register every built-in check on `schema`
///
/// Arguments are verified when the schema is resolved, so a bad `regex` or a
/// `length` without numeric bounds fails resolution instead of reaching data.
pub fn register(schema: &mut Schema) {
    let patterns = Arc::new(PatternCache::default());
    let verified = Arc::clone(&patterns);

    schema
        .define_check("not_empty", Check::new(not_empty))
        .define_check("length", Check::with_args(length).verify_args(verify_bounds))
        .define_check("range", Check::with_args(range).verify_args(verify_bounds))
        .define_check(
            "pattern",
            Check::with_args(move |value: &Value, args: &CheckArgs| pattern(value, args, &patterns))
                .verify_args(move |args: &CheckArgs| verify_pattern(args, &verified)),
        )
        .define_check("one_of", Check::with_args(one_of).verify_args(verify_one_of))
        .define_check("equal_fields", Check::with_args(equal_fields).verify_args(verify_equal_fields));
}

/// Compiled `pattern` regexes, keyed by source
#[derive(Debug, Default)]
struct PatternCache {
    compiled: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    fn get(&self, source: &str) -> Result<Regex, regex::Error> {
        if let Some(regex) = self
            .compiled
            .read()
            .ok()
            .and_then(|compiled| compiled.get(source).cloned())
        {
            return Ok(regex);
        }
        let regex = Regex::new(source)?;
        if let Ok(mut compiled) = self.compiled.write() {
            compiled.insert(source.to_string(), regex.clone());
        }
        Ok(regex)
    }
}

fn verify_bounds(args: &CheckArgs) -> Result<(), String> {
    for key in ["min", "max"] {
        match args.get(key) {
            Some(bound) if !bound.is_number() => {
                return Err(format!("`{}` must be a number, got `{}`", key, bound));
            }
            _ => {}
        }
    }
    match (args.get("min").and_then(Value::as_f64), args.get("max").and_then(Value::as_f64)) {
        (Some(min), Some(max)) if min > max => Err(format!("`min` {} exceeds `max` {}", min, max)),
        _ => Ok(()),
    }
}

fn verify_pattern(args: &CheckArgs, patterns: &PatternCache) -> Result<(), String> {
    let source = args
        .get("regex")
        .and_then(Value::as_str)
        .ok_or("missing `regex` argument")?;
    patterns
        .get(source)
        .map(|_| ())
        .map_err(|err| format!("invalid pattern `{}`: {}", source, err))
}

fn verify_one_of(args: &CheckArgs) -> Result<(), String> {
    match args.get("values") {
        Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(format!("`values` must be an array, got `{}`", other)),
        None => Err("missing `values` argument".to_string()),
    }
}

fn verify_equal_fields(args: &CheckArgs) -> Result<(), String> {
    match args.get("fields").and_then(Value::as_array) {
        Some(fields) if fields.iter().all(Value::is_string) => Ok(()),
        _ => Err("`fields` must be an array of field names".to_string()),
    }
}

fn not_empty(value: &Value) -> Option<&'static str> {
    let empty = match value {
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    };
    empty.then_some("Cannot be empty")
}

fn length(value: &Value, args: &CheckArgs) -> Option<String> {
    let (size, unit) = match value {
        Value::String(s) => (s.chars().count() as u64, "chars"),
        Value::Array(items) => (items.len() as u64, "items"),
        _ => return None,
    };
    let min = args.get("min").and_then(Value::as_u64).unwrap_or(0);
    if size < min {
        return Some(format!("Must contain at least {} {}", min, unit));
    }
    match args.get("max").and_then(Value::as_u64) {
        Some(max) if size > max => Some(format!("Must contain at max {} {}", max, unit)),
        _ => None,
    }
}

fn range(value: &Value, args: &CheckArgs) -> Option<String> {
    let number = value.as_f64()?;
    if let Some(min) = args.get("min").filter(|min| min.as_f64().is_some_and(|min| number < min)) {
        return Some(format!("Must be at least {}", min));
    }
    if let Some(max) = args.get("max").filter(|max| max.as_f64().is_some_and(|max| number > max)) {
        return Some(format!("Must be at most {}", max));
    }
    None
}

fn pattern(value: &Value, args: &CheckArgs, patterns: &PatternCache) -> Option<String> {
    let text = value.as_str()?;
    let Some(source) = args.get("regex").and_then(Value::as_str) else {
        return Some("Missing `regex` argument".to_string());
    };
    match patterns.get(source) {
        Ok(regex) if regex.is_match(text) => None,
        Ok(_) => Some(format!("Must match `{}`", source)),
        Err(_) => Some(format!("Invalid pattern `{}`", source)),
    }
}

fn one_of(value: &Value, args: &CheckArgs) -> Option<String> {
    let allowed = args.get("values").and_then(Value::as_array)?;
    if allowed.contains(value) {
        return None;
    }
    let listed: Vec<String> = allowed
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Some(format!("Must be one of: {}", listed.join(", ")))
}

static NULL: Value = Value::Null;

fn equal_fields(value: &Value, args: &CheckArgs) -> Option<String> {
    let fields = args.get("fields").and_then(Value::as_array)?;
    let mut values = fields
        .iter()
        .filter_map(Value::as_str)
        .map(|field| value.get(field).unwrap_or(&NULL));
    let first = values.next()?;
    if values.all(|other| other == first) {
        return None;
    }
    let message = args
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Must be equal");
    Some(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> CheckArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_not_empty() {
        assert_eq!(not_empty(&json!("")), Some("Cannot be empty"));
        assert_eq!(not_empty(&json!([])), Some("Cannot be empty"));
        assert_eq!(not_empty(&json!("x")), None);
        assert_eq!(not_empty(&json!(0)), None);
    }

    #[test]
    fn test_length() {
        let bounds = args(json!({"min": 2, "max": 3}));
        assert_eq!(length(&json!("a"), &bounds).as_deref(), Some("Must contain at least 2 chars"));
        assert_eq!(length(&json!("abcd"), &bounds).as_deref(), Some("Must contain at max 3 chars"));
        assert_eq!(length(&json!([1, 2, 3, 4]), &bounds).as_deref(), Some("Must contain at max 3 items"));
        assert_eq!(length(&json!("héé"), &bounds), None);
    }

    #[test]
    fn test_range() {
        let bounds = args(json!({"min": 1, "max": 10}));
        assert_eq!(range(&json!(0), &bounds).as_deref(), Some("Must be at least 1"));
        assert_eq!(range(&json!(10.5), &bounds).as_deref(), Some("Must be at most 10"));
        assert_eq!(range(&json!(5), &bounds), None);
    }

    #[test]
    fn test_pattern() {
        let patterns = PatternCache::default();
        let slug = args(json!({"regex": "^[a-z-]+$"}));
        assert_eq!(pattern(&json!("moby-dick"), &slug, &patterns), None);
        assert_eq!(
            pattern(&json!("Moby Dick"), &slug, &patterns).as_deref(),
            Some("Must match `^[a-z-]+$`")
        );
        assert_eq!(pattern(&json!(42), &slug, &patterns), None);
        assert_eq!(patterns.compiled.read().unwrap().len(), 1);
    }

    #[test]
    fn test_argument_verification() {
        let patterns = PatternCache::default();
        assert!(verify_pattern(&args(json!({"regex": "^a"})), &patterns).is_ok());
        assert!(verify_pattern(&args(json!({"regex": "("})), &patterns)
            .unwrap_err()
            .starts_with("invalid pattern `(`"));
        assert_eq!(
            verify_pattern(&CheckArgs::new(), &patterns).unwrap_err(),
            "missing `regex` argument"
        );

        assert!(verify_bounds(&args(json!({"min": 1}))).is_ok());
        assert!(verify_bounds(&args(json!({"min": "1"}))).is_err());
        assert!(verify_bounds(&args(json!({"min": 3, "max": 2}))).is_err());
        assert!(verify_one_of(&CheckArgs::new()).is_err());
        assert!(verify_equal_fields(&args(json!({"fields": ["a", 1]}))).is_err());
    }

    #[test]
    fn test_malformed_pattern_fails_resolution() {
        use crate::validator::{FieldValidator, ObjectValidator, PrimitiveKind};

        let mut schema = Schema::new();
        register(&mut schema);
        schema.define_validator(
            "isbn",
            ObjectValidator::new()
                .field(
                    "code",
                    FieldValidator::optional(PrimitiveKind::String)
                        .check(Check::bind("pattern", json!({"regex": "("}))),
                )
                .unwrap(),
        );
        assert!(matches!(
            schema.resolve(),
            Err(crate::error::SchemaError::MalformedCheck(_))
        ));
    }

    #[test]
    fn test_one_of() {
        let roles = args(json!({"values": ["admin", "member"]}));
        assert_eq!(one_of(&json!("admin"), &roles), None);
        assert_eq!(one_of(&json!("guest"), &roles).as_deref(), Some("Must be one of: admin, member"));
    }

    #[test]
    fn test_equal_fields() {
        let same = args(json!({"fields": ["password", "confirm_password"], "message": "Passwords must be equal"}));
        assert_eq!(equal_fields(&json!({"password": "a", "confirm_password": "a"}), &same), None);
        assert_eq!(
            equal_fields(&json!({"password": "a", "confirm_password": "b"}), &same).as_deref(),
            Some("Passwords must be equal")
        );
    }

    #[test]
    fn test_register() {
        let mut schema = Schema::new();
        register(&mut schema);
        let names: Vec<&str> = schema.check_names().collect();
        assert_eq!(names, vec!["equal_fields", "length", "not_empty", "one_of", "pattern", "range"]);
    }
}
