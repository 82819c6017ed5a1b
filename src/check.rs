//! Checks: single-value predicates attachable to primitive fields
//!
//! A check is either an inline predicate, a by-name reference to a check
//! registered on the [`Schema`], or a reference with a set of bound named
//! arguments (`length(min: 2, max: 3)` style).

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;

/// Named arguments passed to a parametrized check
pub type CheckArgs = serde_json::Map<String, Value>;

/// What a predicate returns
///
/// Predicates are written as terse expressions, so anything that reads as
/// "nothing", "one message" or "several messages" converts into an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckOutcome {
    #[default]
    Pass,
    Message(String),
    Messages(Vec<String>),
}

impl CheckOutcome {
    /// Normalize into the canonical message list
    pub fn into_messages(self) -> Vec<String> {
        match self {
            CheckOutcome::Pass => Vec::new(),
            CheckOutcome::Message(message) => vec![message],
            CheckOutcome::Messages(messages) => messages,
        }
    }
}

impl From<()> for CheckOutcome {
    fn from(_: ()) -> Self {
        CheckOutcome::Pass
    }
}

impl From<String> for CheckOutcome {
    fn from(message: String) -> Self {
        CheckOutcome::Message(message)
    }
}

impl From<&str> for CheckOutcome {
    fn from(message: &str) -> Self {
        CheckOutcome::Message(message.to_string())
    }
}

impl From<Vec<String>> for CheckOutcome {
    fn from(messages: Vec<String>) -> Self {
        CheckOutcome::Messages(messages)
    }
}

impl From<Vec<&str>> for CheckOutcome {
    fn from(messages: Vec<&str>) -> Self {
        CheckOutcome::Messages(messages.into_iter().map(String::from).collect())
    }
}

impl<T: Into<CheckOutcome>> From<Option<T>> for CheckOutcome {
    fn from(outcome: Option<T>) -> Self {
        outcome.map(Into::into).unwrap_or_default()
    }
}

type PredicateFn = dyn Fn(&Value, Option<&CheckArgs>) -> CheckOutcome + Send + Sync;

type VerifyFn = dyn Fn(&CheckArgs) -> std::result::Result<(), String> + Send + Sync;

/// A shared predicate closure, with an optional argument verifier run at
/// resolve time
#[derive(Clone)]
pub struct Predicate {
    call: Arc<PredicateFn>,
    verify: Option<Arc<VerifyFn>>,
}

impl Predicate {
    fn new(call: Arc<PredicateFn>) -> Self {
        Self { call, verify: None }
    }

    fn call(&self, value: &Value, args: Option<&CheckArgs>) -> Vec<String> {
        (self.call)(value, args).into_messages()
    }

    fn verify(&self, args: &CheckArgs) -> std::result::Result<(), String> {
        match &self.verify {
            Some(verify) => verify(args),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("verified", &self.verify.is_some())
            .finish_non_exhaustive()
    }
}

/// A single-value validation rule
#[derive(Debug, Clone)]
pub enum Check {
    /// Inline predicate
    Predicate(Predicate),
    /// Named check looked up in the owning schema
    Reference(String),
    /// Check with pre-bound named arguments; call-site arguments win
    Bound { check: Box<Check>, args: Value },
}

impl Check {
    /// Wrap a one-argument predicate. Arguments, if any, are ignored.
    pub fn new<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        Check::Predicate(Predicate::new(Arc::new(move |value, _| predicate(value).into())))
    }

    /// Wrap a two-argument predicate receiving named arguments.
    pub fn with_args<F, R>(predicate: F) -> Self
    where
        F: Fn(&Value, &CheckArgs) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        Check::Predicate(Predicate::new(Arc::new(move |value, args| match args {
            Some(args) => predicate(value, args).into(),
            None => predicate(value, &CheckArgs::new()).into(),
        })))
    }

    /// Attach an argument verifier to a predicate. It runs when the schema is
    /// resolved, against the arguments bound at each use; an `Err` fails
    /// resolution with [`SchemaError::MalformedCheck`]. Ignored on references
    /// and bound checks.
    pub fn verify_args<F>(self, verify: F) -> Self
    where
        F: Fn(&CheckArgs) -> std::result::Result<(), String> + Send + Sync + 'static,
    {
        match self {
            Check::Predicate(mut predicate) => {
                predicate.verify = Some(Arc::new(verify));
                Check::Predicate(predicate)
            }
            other => other,
        }
    }

    /// Refer to a check registered on the schema by name
    pub fn reference(name: impl Into<String>) -> Self {
        Check::Reference(name.into())
    }

    /// Bind named arguments to a check. `args` must be a JSON object; anything
    /// else is reported when the schema is resolved.
    pub fn bind(check: impl Into<Check>, args: Value) -> Self {
        Check::Bound {
            check: Box::new(check.into()),
            args,
        }
    }

    /// Run the check, returning every message it produced.
    pub fn validate(&self, value: &Value, args: Option<&CheckArgs>, schema: &Schema) -> Vec<String> {
        match self {
            Check::Predicate(predicate) => predicate.call(value, args),
            Check::Reference(name) => match schema.resolve_check(name) {
                Ok(check) => check.validate(value, args, schema),
                Err(err) => {
                    tracing::warn!(check = %name, "check reference missed at validation time");
                    vec![err.to_string()]
                }
            },
            Check::Bound { check, args: bound } => {
                let mut merged = bound.as_object().cloned().unwrap_or_default();
                if let Some(extra) = args {
                    for (key, value) in extra {
                        merged.insert(key.clone(), value.clone());
                    }
                }
                check.validate(value, Some(&merged), schema)
            }
        }
    }

    /// Follow this check down to the predicate it ends at.
    ///
    /// Bound checks are walked through and their arguments verified; a chain
    /// of references that loops back on itself is an error.
    pub fn resolve<'s>(&'s self, schema: &'s Schema) -> Result<&'s Check> {
        self.resolve_with(schema, false)
    }

    /// Resolve a check attached to a field, list or invariant. Its arguments
    /// are final there, so they are verified even when none are bound.
    pub(crate) fn resolve_attached<'s>(&'s self, schema: &'s Schema) -> Result<&'s Check> {
        self.resolve_with(schema, true)
    }

    fn resolve_with<'s>(&'s self, schema: &'s Schema, attached: bool) -> Result<&'s Check> {
        let mut visited: Vec<&str> = Vec::new();
        let mut merged = CheckArgs::new();
        let mut verify = attached;
        let mut current = self;
        loop {
            match current {
                Check::Predicate(predicate) => {
                    if verify {
                        predicate.verify(&merged).map_err(|reason| {
                            let name = visited.last().copied().unwrap_or("inline check");
                            SchemaError::MalformedCheck(format!("`{}': {}", name, reason))
                        })?;
                    }
                    return Ok(current);
                }
                Check::Bound { check, args } => {
                    let Some(args) = args.as_object() else {
                        return Err(SchemaError::MalformedCheck(format!(
                            "bound arguments must be an object, got `{}`",
                            args
                        )));
                    };
                    // outer bindings win, as in `validate`
                    for (key, value) in args {
                        if !merged.contains_key(key) {
                            merged.insert(key.clone(), value.clone());
                        }
                    }
                    verify = true;
                    current = check.as_ref();
                }
                Check::Reference(name) => {
                    if visited.contains(&name.as_str()) {
                        let mut cycle: Vec<String> = visited.iter().map(|s| s.to_string()).collect();
                        cycle.push(name.clone());
                        return Err(SchemaError::CircularReference(cycle));
                    }
                    visited.push(name);
                    current = schema.resolve_check(name)?;
                }
            }
        }
    }
}

impl From<&str> for Check {
    fn from(name: &str) -> Self {
        Check::reference(name)
    }
}

impl From<String> for Check {
    fn from(name: String) -> Self {
        Check::Reference(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn length() -> Check {
        Check::with_args(|value: &Value, args: &CheckArgs| {
            let size = value.as_str().map(|s| s.chars().count()).unwrap_or(0) as u64;
            let min = args.get("min").and_then(Value::as_u64).unwrap_or(0);
            if size < min {
                return Some(format!("Must contain at least {} elements", min));
            }
            match args.get("max").and_then(Value::as_u64) {
                Some(max) if size > max => Some(format!("Must contain at max {} elements", max)),
                _ => None,
            }
        })
    }

    fn needs_limit() -> Check {
        Check::with_args(|_: &Value, _: &CheckArgs| ()).verify_args(|args: &CheckArgs| {
            match args.get("limit") {
                Some(limit) if limit.is_u64() => Ok(()),
                Some(other) => Err(format!("`limit` must be a count, got `{}`", other)),
                None => Err("missing `limit` argument".to_string()),
            }
        })
    }

    #[test]
    fn test_outcome_normalization() {
        assert!(CheckOutcome::from(()).into_messages().is_empty());
        assert!(CheckOutcome::from(None::<String>).into_messages().is_empty());
        assert_eq!(CheckOutcome::from("bad").into_messages(), vec!["bad"]);
        assert_eq!(CheckOutcome::from(Some("bad")).into_messages(), vec!["bad"]);
        assert_eq!(CheckOutcome::from(vec!["a", "b"]).into_messages(), vec!["a", "b"]);
    }

    #[test]
    fn test_predicate_check() {
        let schema = Schema::new();
        let not_empty = Check::new(|v: &Value| {
            if v.as_str() == Some("") { Some("Cannot be empty") } else { None }
        });
        assert_eq!(not_empty.validate(&json!(""), None, &schema), vec!["Cannot be empty"]);
        assert!(not_empty.validate(&json!("x"), None, &schema).is_empty());
    }

    #[test]
    fn test_bound_args_are_overridden_by_call_site() {
        let mut schema = Schema::new();
        schema.define_check("length", length());
        let bound = Check::bind("length", json!({"min": 2, "max": 3}));

        let call_site: CheckArgs = json!({"max": 5}).as_object().cloned().unwrap();
        assert!(bound.validate(&json!("abcd"), Some(&call_site), &schema).is_empty());
        assert_eq!(
            bound.validate(&json!("abcd"), None, &schema),
            vec!["Must contain at max 3 elements"]
        );
        assert_eq!(
            bound.validate(&json!("a"), Some(&call_site), &schema),
            vec!["Must contain at least 2 elements"]
        );
    }

    #[test]
    fn test_resolve_terminates_at_predicate() {
        let mut schema = Schema::new();
        schema.define_check("length", length());
        schema.define_check("size", Check::reference("length"));
        let bound = Check::bind("size", json!({"min": 1}));
        assert!(matches!(bound.resolve(&schema).unwrap(), Check::Predicate(_)));
    }

    #[test]
    fn test_resolve_reports_undefined_and_cycles() {
        let mut schema = Schema::new();
        assert!(matches!(
            Check::reference("missing").resolve(&schema),
            Err(SchemaError::UndefinedCheck { .. })
        ));

        schema.define_check("a", Check::reference("b"));
        schema.define_check("b", Check::bind("a", json!({})));
        assert!(matches!(
            Check::reference("a").resolve(&schema),
            Err(SchemaError::CircularReference(_))
        ));
    }

    #[test]
    fn test_malformed_bound_args() {
        let mut schema = Schema::new();
        schema.define_check("length", length());
        let bound = Check::bind("length", json!([1, 2]));
        assert!(matches!(bound.resolve(&schema), Err(SchemaError::MalformedCheck(_))));
    }

    #[test]
    fn test_verifier_runs_on_bound_and_attached_uses() {
        let mut schema = Schema::new();
        schema.define_check("capped", needs_limit());

        // registering the check alone is not a use
        assert!(schema.resolve_check("capped").unwrap().resolve(&schema).is_ok());

        assert!(Check::bind("capped", json!({"limit": 3})).resolve(&schema).is_ok());
        match Check::bind("capped", json!({"limit": "x"})).resolve(&schema) {
            Err(SchemaError::MalformedCheck(reason)) => {
                assert_eq!(reason, "`capped': `limit` must be a count, got `\"x\"`");
            }
            other => panic!("Expected MalformedCheck, got {:?}", other),
        }

        assert!(Check::reference("capped").resolve(&schema).is_ok());
        assert!(matches!(
            Check::reference("capped").resolve_attached(&schema),
            Err(SchemaError::MalformedCheck(_))
        ));
    }

    #[test]
    fn test_outer_binding_wins_during_verification() {
        let mut schema = Schema::new();
        schema.define_check("capped", needs_limit());
        schema.define_check("broken", Check::bind("capped", json!({"limit": "x"})));
        assert!(Check::bind("broken", json!({"limit": 2})).resolve(&schema).is_ok());
    }
}
