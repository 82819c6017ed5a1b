//! Schema declaration documents
//!
//! Lets a schema be declared as data instead of code. Checks are referenced
//! by name, so a document can only use checks that are registered on the
//! schema it is applied to (the [built-ins](crate::builtin) by default).
//!
//! ```json
//! {
//!   "objects": {
//!     "post": {
//!       "fields": {
//!         "title": { "type": "String", "required": true,
//!                    "checks": ["not_empty", { "check": "length", "args": { "max": 80 } }] },
//!         "tags":  { "type": { "list": "tag" } }
//!       }
//!     },
//!     "tag": { "fields": { "name": { "type": "String", "required": true } } }
//!   },
//!   "lists": {
//!     "point": { "items": "Float", "checks": [{ "check": "length", "args": { "min": 2, "max": 2 } }] }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::check::{Check, CheckArgs};
use crate::config::EngineConfig;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::validator::{FieldValidator, Invariant, ListValidator, ObjectValidator, PrimitiveKind, Validator};

/// A whole schema as data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    #[serde(default)]
    pub objects: BTreeMap<String, ObjectDecl>,
    #[serde(default)]
    pub lists: BTreeMap<String, ListDecl>,
    /// Plain aliases, e.g. `"id": "Integer"`
    #[serde(default)]
    pub types: BTreeMap<String, TypeSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDecl {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDecl>,
    #[serde(default)]
    pub invariants: Vec<InvariantDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvariantDecl {
    #[serde(default)]
    pub fields: Vec<String>,
    pub check: String,
    #[serde(default)]
    pub args: Option<CheckArgs>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListDecl {
    pub items: TypeSpec,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

/// A type: a primitive or `bool`/`any` keyword, a reference, or a list
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Named(String),
    List { list: Box<TypeSpec> },
}

/// A check: a registered name, optionally with bound arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckSpec {
    Named(String),
    Bound {
        check: String,
        #[serde(default)]
        args: CheckArgs,
    },
}

impl TypeSpec {
    fn to_validator(&self) -> Validator {
        match self {
            TypeSpec::Named(name) => match name.as_str() {
                "bool" | "boolean" | "Boolean" => Validator::Boolean,
                "any" | "Any" => Validator::Any,
                other => PrimitiveKind::from_name(other)
                    .map(Validator::Primitive)
                    .unwrap_or_else(|| Validator::reference(other)),
            },
            TypeSpec::List { list } => Validator::list(list.to_validator()),
        }
    }
}

impl CheckSpec {
    fn to_check(&self) -> Check {
        match self {
            CheckSpec::Named(name) => Check::reference(name.as_str()),
            CheckSpec::Bound { check, args } => {
                Check::bind(check.as_str(), serde_json::Value::Object(args.clone()))
            }
        }
    }
}

impl SchemaDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a document, picking the format from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(SchemaError::InvalidDocument(format!(
                "unsupported extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Define every declared type on `schema`. The schema still needs to be
    /// resolved afterwards.
    pub fn apply(&self, schema: &mut Schema) -> Result<()> {
        for (name, spec) in &self.types {
            schema.define_validator(name.as_str(), spec.to_validator());
        }

        for (name, decl) in &self.lists {
            let mut list = ListValidator::new(decl.items.to_validator());
            for check in &decl.checks {
                list = list.check(check.to_check());
            }
            schema.define_validator(name.as_str(), list);
        }

        for (name, decl) in &self.objects {
            let mut object = ObjectValidator::new();
            for (field_name, field) in &decl.fields {
                let mut validator = FieldValidator::new(field.ty.to_validator(), field.required);
                for check in &field.checks {
                    validator = validator.check(check.to_check());
                }
                object.insert_field(field_name.as_str(), validator)?;
            }
            for invariant in &decl.invariants {
                let check = match &invariant.args {
                    Some(args) => Check::bind(invariant.check.as_str(), serde_json::Value::Object(args.clone())),
                    None => Check::reference(invariant.check.as_str()),
                };
                object.push_invariant(Invariant::new(invariant.fields.iter().cloned(), check));
            }
            schema.define_validator(name.as_str(), object);
        }
        Ok(())
    }

    /// Build and resolve a schema from this document
    pub fn build_schema(&self, config: &EngineConfig) -> Result<Schema> {
        let mut schema = Schema::from_config(config);
        self.apply(&mut schema)?;
        schema.resolve()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BLOG: &str = r#"{
        "objects": {
            "post": {
                "fields": {
                    "title": {"type": "String", "required": true, "checks": ["not_empty"]},
                    "tags": {"type": {"list": "tag"}}
                }
            },
            "tag": {"fields": {"name": {"type": "String", "required": true}}}
        }
    }"#;

    #[test]
    fn test_json_document() {
        let schema = SchemaDocument::from_json_str(BLOG)
            .unwrap()
            .build_schema(&EngineConfig::default())
            .unwrap();
        let errors = schema.validate("post", &json!({"title": "", "tags": [{}, {"name": "x"}]})).unwrap();
        assert_eq!(
            errors.to_json(),
            json!({"title": ["Cannot be empty"], "tags": {"0": {"name": ["Cannot be null"]}}})
        );
    }

    #[test]
    fn test_toml_document() {
        let doc = SchemaDocument::from_toml_str(
            r#"
            [types]
            id = "Integer"

            [objects.account.fields.id]
            type = "id"
            required = true

            [objects.account.fields.password]
            type = "String"
            required = true
            checks = [{ check = "length", args = { min = 8 } }]

            [objects.account.fields.confirm_password]
            type = "String"
            required = true

            [[objects.account.invariants]]
            fields = ["confirm_password"]
            check = "equal_fields"
            args = { fields = ["password", "confirm_password"], message = "Passwords must be equal" }
            "#,
        )
        .unwrap();
        let schema = doc.build_schema(&EngineConfig::default()).unwrap();

        let short = json!({"id": 1, "password": "short", "confirm_password": "short"});
        assert_eq!(
            schema.validate("account", &short).unwrap().to_json(),
            json!({"password": ["Must contain at least 8 chars"]})
        );
        let mismatch = json!({"id": 1, "password": "long enough", "confirm_password": "long enougH"});
        assert_eq!(
            schema.validate("account", &mismatch).unwrap().to_json(),
            json!({"confirm_password": ["Passwords must be equal"]})
        );
    }

    #[test]
    fn test_type_keywords() {
        assert!(matches!(TypeSpec::Named("bool".into()).to_validator(), Validator::Boolean));
        assert!(matches!(TypeSpec::Named("any".into()).to_validator(), Validator::Any));
        assert!(matches!(
            TypeSpec::Named("Numeric".into()).to_validator(),
            Validator::Primitive(PrimitiveKind::Numeric)
        ));
        assert!(matches!(TypeSpec::Named("tag".into()).to_validator(), Validator::Reference(_)));
    }

    #[test]
    fn test_dangling_names_fail() {
        let doc = SchemaDocument::from_json_str(
            r#"{"objects": {"post": {"fields": {"tags": {"type": {"list": "tag"}}}}}}"#,
        )
        .unwrap();
        let err = doc.build_schema(&EngineConfig::default()).unwrap_err();
        assert_eq!(err.undefined_names(), vec!["tag"]);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(SchemaDocument::from_json_str(r#"{"object": {}}"#).is_err());
    }
}
