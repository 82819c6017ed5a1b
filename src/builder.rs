//! Declaration helpers
//!
//! A thin layer over [`Schema::define_validator`] and
//! [`Schema::define_check`] for writing schemas compactly:
//!
//! ```
//! use dto_schema::builder::list;
//! use dto_schema::{PrimitiveKind, Schema};
//! use serde_json::{json, Value};
//!
//! let schema = Schema::define(|s| {
//!     s.object("tree", |o| {
//!         o.required("value", PrimitiveKind::Numeric);
//!         o.optional("child", list("tree"));
//!     });
//!     s.object("tag", |o| {
//!         o.required("name", PrimitiveKind::String).check("not_empty");
//!     });
//!     s.check("not_empty", |value: &Value| {
//!         (value.as_str() == Some("")).then_some("Cannot be empty")
//!     });
//! })
//! .unwrap();
//!
//! let errors = schema.validate("tree", &json!({"value": 1, "child": [{"value": "x"}]})).unwrap();
//! assert_eq!(errors.to_json(), json!({"child": {"0": {"value": ["Must be a Numeric"]}}}));
//! ```

use serde_json::Value;

use crate::check::{Check, CheckArgs, CheckOutcome};
use crate::config::EngineConfig;
use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::validator::{FieldValidator, Invariant, ListValidator, ObjectValidator, Validator};

/// List type over `item`
pub fn list(item: impl Into<Validator>) -> Validator {
    Validator::list(item)
}

/// Type accepting every value
pub fn any() -> Validator {
    Validator::Any
}

/// Type accepting `true` and `false`
pub fn boolean() -> Validator {
    Validator::Boolean
}

/// Named check with bound arguments, e.g. `bind("length", json!({"min": 3}))`
pub fn bind(name: &str, args: Value) -> Check {
    Check::bind(name, args)
}

impl Schema {
    /// Declare a schema with a [`SchemaBuilder`] and resolve it.
    ///
    /// Starts from an empty [`Schema::new`], so the [built-in
    /// checks](crate::builtin) are not registered; use [`Schema::define_with`]
    /// to start from a configuration as documents do.
    pub fn define<F>(declare: F) -> Result<Schema>
    where
        F: FnOnce(&mut SchemaBuilder<'_>),
    {
        let mut schema = Schema::new();
        schema.extend(declare)?;
        Ok(schema)
    }

    /// Like [`Schema::define`], starting from [`Schema::from_config`].
    pub fn define_with<F>(config: &EngineConfig, declare: F) -> Result<Schema>
    where
        F: FnOnce(&mut SchemaBuilder<'_>),
    {
        let mut schema = Schema::from_config(config);
        schema.extend(declare)?;
        Ok(schema)
    }

    /// Add declarations to this schema and resolve it again.
    pub fn extend<F>(&mut self, declare: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut SchemaBuilder<'_>),
    {
        let mut builder = SchemaBuilder {
            schema: self,
            errors: Vec::new(),
        };
        declare(&mut builder);
        let SchemaBuilder { schema, errors } = builder;
        if let Some(err) = errors.into_iter().next() {
            return Err(err);
        }
        schema.resolve()
    }
}

/// Collects declarations into a schema
pub struct SchemaBuilder<'s> {
    schema: &'s mut Schema,
    errors: Vec<SchemaError>,
}

impl<'s> SchemaBuilder<'s> {
    /// Declare an object type
    pub fn object<F>(&mut self, name: &str, declare: F) -> &mut Self
    where
        F: FnOnce(&mut ObjectBuilder),
    {
        let mut builder = ObjectBuilder::default();
        declare(&mut builder);
        match builder.build() {
            Ok(object) => {
                self.schema.define_validator(name, object);
            }
            Err(err) => self.errors.push(err),
        }
        self
    }

    /// Declare a list type. Checks added to the returned declaration run
    /// against the whole list.
    pub fn list(&mut self, name: &str, item: impl Into<Validator>) -> ListDecl<'_> {
        self.schema.define_validator(name, ListValidator::new(item));
        ListDecl {
            schema: &mut *self.schema,
            name: name.to_string(),
        }
    }

    /// Declare an alias or standalone type
    pub fn validator(&mut self, name: &str, validator: impl Into<Validator>) -> &mut Self {
        self.schema.define_validator(name, validator);
        self
    }

    /// Declare a reusable one-argument check
    pub fn check<F, R>(&mut self, name: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        self.schema.define_check(name, Check::new(predicate));
        self
    }

    /// Declare a reusable check taking named arguments
    pub fn check_with_args<F, R>(&mut self, name: &str, predicate: F) -> &mut Self
    where
        F: Fn(&Value, &CheckArgs) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        self.schema.define_check(name, Check::with_args(predicate));
        self
    }
}

/// A list type being declared
pub struct ListDecl<'a> {
    schema: &'a mut Schema,
    name: String,
}

impl ListDecl<'_> {
    pub fn check(&mut self, check: impl Into<Check>) -> &mut Self {
        let check = check.into();
        if let Some(Validator::List(list)) = self.schema.validator_mut(&self.name) {
            list.push_check(check);
        }
        self
    }

    pub fn check_with<F, R>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        self.check(Check::new(predicate))
    }
}

/// Fields and invariants of an object type being declared
#[derive(Default)]
pub struct ObjectBuilder {
    fields: Vec<(String, FieldValidator)>,
    invariants: Vec<Invariant>,
}

impl ObjectBuilder {
    pub fn required(&mut self, name: &str, ty: impl Into<Validator>) -> FieldDecl<'_> {
        self.field(name, true, ty)
    }

    pub fn optional(&mut self, name: &str, ty: impl Into<Validator>) -> FieldDecl<'_> {
        self.field(name, false, ty)
    }

    pub fn field(&mut self, name: &str, required: bool, ty: impl Into<Validator>) -> FieldDecl<'_> {
        let field = FieldValidator::new(ty, required);
        let index = match self.fields.iter().position(|(existing, _)| existing == name) {
            Some(index) => {
                self.fields[index].1 = field;
                index
            }
            None => {
                self.fields.push((name.to_string(), field));
                self.fields.len() - 1
            }
        };
        FieldDecl {
            field: &mut self.fields[index].1,
        }
    }

    /// Inline invariant; an empty `fields` slice reports on the object itself
    pub fn invariant<F, R>(&mut self, fields: &[&str], predicate: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        self.invariants.push(Invariant::predicate(fields.iter().copied(), predicate));
        self
    }

    /// Invariant backed by a named or bound check
    pub fn invariant_check(&mut self, fields: &[&str], check: impl Into<Check>) -> &mut Self {
        self.invariants.push(Invariant::new(fields.iter().copied(), check));
        self
    }

    fn build(self) -> Result<ObjectValidator> {
        let mut object = ObjectValidator::new();
        for (name, field) in self.fields {
            object.insert_field(name, field)?;
        }
        for invariant in self.invariants {
            object.push_invariant(invariant);
        }
        Ok(object)
    }
}

/// A field being declared
pub struct FieldDecl<'a> {
    field: &'a mut FieldValidator,
}

impl FieldDecl<'_> {
    /// Attach a named, bound or inline check
    pub fn check(&mut self, check: impl Into<Check>) -> &mut Self {
        self.field.push_check(check.into());
        self
    }

    /// Attach an inline predicate
    pub fn check_with<F, R>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<CheckOutcome>,
    {
        self.check(Check::new(predicate))
    }
}
