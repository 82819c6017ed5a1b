//! DTO Schema
//!
//! Declarative validation for tree-shaped data transfer objects: nested
//! records, lists and primitives as decoded from JSON.
//!
//! ## Features
//!
//! - **Named types**: objects and lists are registered by name and can refer
//!   to each other (and themselves) before they are defined
//! - **Eager resolution**: every dangling name is reported once, before any
//!   data is validated
//! - **Reusable checks**: inline predicates, named checks and checks with
//!   bound arguments (`length` with `min`/`max`)
//! - **Invariants**: cross-field rules that run once every field is valid
//! - **Shape-mirroring errors**: the [`ErrorTree`] has the shape of the data
//!
//! ## Architecture
//!
//! ```text
//! Schema
//! ├── validators: name -> Validator
//! │   ├── Any | Boolean | Primitive(kind)
//! │   ├── List(item, checks)
//! │   ├── Object(fields, invariants)
//! │   │   └── FieldValidator(type, required, checks)
//! │   └── Reference(name)        -> looked up in the schema
//! └── checks: name -> Check
//!     ├── Predicate(fn)
//!     ├── Reference(name)        -> looked up in the schema
//!     └── Bound(check, args)
//! ```

pub mod builder;
pub mod builtin;
pub mod check;
pub mod config;
pub mod document;
pub mod error;
pub mod report;
pub mod schema;
pub mod validator;

pub use check::{Check, CheckArgs, CheckOutcome};
pub use config::EngineConfig;
pub use document::SchemaDocument;
pub use error::{Result, SchemaError};
pub use report::ErrorTree;
pub use schema::{Schema, TypeHandle};
pub use validator::{
    FieldValidator, Invariant, ListValidator, ObjectValidator, PrimitiveKind, Validator,
};
