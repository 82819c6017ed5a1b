//! Object (record) validation

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::{FieldValidator, Invariant, Scope, CANNOT_BE_NULL, DEPTH_EXCEEDED, MUST_BE_OBJECT};
use crate::error::{Result, SchemaError};
use crate::report::ErrorTree;
use crate::schema::Schema;

/// A key-value record with declared fields and cross-field invariants
#[derive(Debug, Clone, Default)]
pub struct ObjectValidator {
    fields: Vec<(String, FieldValidator)>,
    invariants: Vec<Invariant>,
}

impl ObjectValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing any earlier field of the same name.
    pub fn field(mut self, name: impl Into<String>, field: FieldValidator) -> Result<Self> {
        self.insert_field(name, field)?;
        Ok(self)
    }

    pub fn insert_field(&mut self, name: impl Into<String>, field: FieldValidator) -> Result<()> {
        let name = name.into();
        if !field.checks().is_empty() && !field.validator().is_primitive() {
            return Err(SchemaError::ChecksOnNonPrimitive { field: name });
        }
        match self.fields.iter().position(|(existing, _)| *existing == name) {
            Some(index) => self.fields[index].1 = field,
            None => self.fields.push((name, field)),
        }
        Ok(())
    }

    pub fn invariant(mut self, invariant: Invariant) -> Self {
        self.invariants.push(invariant);
        self
    }

    pub fn push_invariant(&mut self, invariant: Invariant) {
        self.invariants.push(invariant);
    }

    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValidator)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValidator> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, field)| field)
    }

    pub fn invariants(&self) -> &[Invariant] {
        &self.invariants
    }

    /// Whether any declared field has a value to descend into
    fn has_values(&self, data: &Map<String, Value>) -> bool {
        self.fields
            .iter()
            .any(|(name, _)| data.get(name).is_some_and(|value| !value.is_null()))
    }

    /// Every field is validated; invariants only run once no field has an
    /// error, and the first failing invariant wins.
    pub(crate) fn validate(&self, value: &Value, scope: Scope<'_>) -> ErrorTree {
        let data = match value {
            Value::Null => return ErrorTree::message(CANNOT_BE_NULL),
            Value::Object(data) => data,
            _ => return ErrorTree::message(MUST_BE_OBJECT),
        };
        let Some(inner) = scope.enter(self.has_values(data)) else {
            return ErrorTree::message(DEPTH_EXCEEDED);
        };

        let mut errors = BTreeMap::new();
        for (name, field) in &self.fields {
            let result = field.validate(data.get(name), inner);
            if !result.is_empty() {
                errors.insert(name.clone(), result);
            }
        }
        if !errors.is_empty() {
            return ErrorTree::Fields(errors);
        }

        for invariant in &self.invariants {
            let result = invariant.validate(value, scope.schema());
            if !result.is_empty() {
                return result;
            }
        }
        ErrorTree::Fields(errors)
    }

    pub(crate) fn is_valid(&self, value: &Value, scope: Scope<'_>) -> bool {
        let Value::Object(data) = value else {
            return false;
        };
        let Some(inner) = scope.enter(self.has_values(data)) else {
            return false;
        };
        self.fields
            .iter()
            .all(|(name, field)| field.is_valid(data.get(name), inner))
            && self
                .invariants
                .iter()
                .all(|invariant| invariant.validate(value, scope.schema()).is_empty())
    }

    pub(crate) fn is_valid_structure(&self, value: &Value, scope: Scope<'_>) -> bool {
        let Value::Object(data) = value else {
            return false;
        };
        let Some(inner) = scope.enter(self.has_values(data)) else {
            return false;
        };
        self.fields
            .iter()
            .all(|(name, field)| field.is_valid_structure(data.get(name), inner))
    }

    pub(crate) fn resolve(&self, schema: &Schema, errors: &mut Vec<SchemaError>) {
        for (_, field) in &self.fields {
            field.resolve(schema, errors);
        }
        for invariant in &self.invariants {
            invariant.resolve(schema, errors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::Check;
    use crate::validator::{PrimitiveKind, Validator};
    use serde_json::json;

    fn tag() -> ObjectValidator {
        ObjectValidator::new()
            .field("name", FieldValidator::required(PrimitiveKind::String))
            .unwrap()
            .field("value", FieldValidator::required(PrimitiveKind::String))
            .unwrap()
    }

    #[test]
    fn test_non_object_values() {
        let schema = Schema::new();
        let scope = Scope::root(&schema);
        assert_eq!(tag().validate(&Value::Null, scope), ErrorTree::message("Cannot be null"));
        assert_eq!(tag().validate(&json!(42), scope), ErrorTree::message("Must be object"));
        assert!(!tag().is_valid_structure(&json!([]), scope));
    }

    #[test]
    fn test_all_fields_reported() {
        let schema = Schema::new();
        let result = tag().validate(&json!({"value": 42}), Scope::root(&schema));
        assert_eq!(
            result.to_json(),
            json!({"name": ["Cannot be null"], "value": ["Must be a String"]})
        );
    }

    #[test]
    fn test_valid_object_is_empty_map() {
        let schema = Schema::new();
        let result = tag().validate(&json!({"name": "foo", "value": "bar"}), Scope::root(&schema));
        assert_eq!(result, ErrorTree::Fields(BTreeMap::new()));
    }

    #[test]
    fn test_checks_rejected_on_non_primitive_fields() {
        let field = FieldValidator::required(Validator::list(PrimitiveKind::String)).check("not_empty");
        let err = ObjectValidator::new().field("tags", field).unwrap_err();
        assert!(matches!(err, SchemaError::ChecksOnNonPrimitive { ref field } if field == "tags"));

        let boolean = FieldValidator::required(Validator::Boolean).check(Check::new(|_: &Value| ()));
        assert!(ObjectValidator::new().field("flag", boolean).is_err());
    }

    #[test]
    fn test_invariants_wait_for_fields() {
        let schema = Schema::new();
        let account = ObjectValidator::new()
            .field("password", FieldValidator::required(PrimitiveKind::String))
            .unwrap()
            .field("confirm_password", FieldValidator::required(PrimitiveKind::String))
            .unwrap()
            .invariant(Invariant::predicate(["confirm_password"], |data: &Value| {
                (data["password"] != data["confirm_password"]).then_some("Passwords must be equal")
            }));
        let scope = Scope::root(&schema);

        assert_eq!(
            account.validate(&json!({"password": "foo"}), scope).to_json(),
            json!({"confirm_password": ["Cannot be null"]})
        );
        assert_eq!(
            account.validate(&json!({"password": "foo", "confirm_password": "bar"}), scope).to_json(),
            json!({"confirm_password": ["Passwords must be equal"]})
        );
        assert!(account.is_valid(&json!({"password": "foo", "confirm_password": "foo"}), scope));
        assert!(account.is_valid_structure(&json!({"password": "foo", "confirm_password": "bar"}), scope));
    }

    #[test]
    fn test_first_failing_invariant_wins() {
        let schema = Schema::new();
        let object = ObjectValidator::new()
            .invariant(Invariant::predicate(["a"], |_: &Value| "first"))
            .invariant(Invariant::predicate(["b"], |_: &Value| "second"));
        assert_eq!(
            object.validate(&json!({}), Scope::root(&schema)).to_json(),
            json!({"a": ["first"]})
        );
    }

    #[test]
    fn test_redeclared_field_replaces() {
        let object = tag()
            .field("name", FieldValidator::optional(PrimitiveKind::Numeric))
            .unwrap();
        assert_eq!(object.fields().count(), 2);
        assert!(!object.get_field("name").unwrap().is_required());
    }
}
