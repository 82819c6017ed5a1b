//! Shape-mirroring validation results
//!
//! An [`ErrorTree`] has the shape of the data that was validated: a flat list
//! of messages for a leaf, a map keyed by field name for an object, and a map
//! keyed by 0-based index for a list. Only failing positions appear in a map,
//! and an empty tree of any kind means the value is valid.

use serde::Serialize;
use std::collections::BTreeMap;

/// Validation result for a single position in the data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorTree {
    /// Leaf failure (or `[]` when the leaf is valid)
    Messages(Vec<String>),
    /// Object position, keyed by field name
    Fields(BTreeMap<String, ErrorTree>),
    /// List position, keyed by element index
    Items(BTreeMap<usize, ErrorTree>),
}

impl Default for ErrorTree {
    fn default() -> Self {
        ErrorTree::valid()
    }
}

impl ErrorTree {
    /// A valid leaf
    pub fn valid() -> Self {
        ErrorTree::Messages(Vec::new())
    }

    /// A leaf with a single message
    pub fn message(message: impl Into<String>) -> Self {
        ErrorTree::Messages(vec![message.into()])
    }

    /// Whether this position (and everything below it) is valid
    pub fn is_empty(&self) -> bool {
        match self {
            ErrorTree::Messages(messages) => messages.is_empty(),
            ErrorTree::Fields(fields) => fields.is_empty(),
            ErrorTree::Items(items) => items.is_empty(),
        }
    }

    /// Leaf messages, if this is a leaf
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            ErrorTree::Messages(messages) => Some(messages),
            _ => None,
        }
    }

    /// Error subtree for a field of an object position
    pub fn field(&self, name: &str) -> Option<&ErrorTree> {
        match self {
            ErrorTree::Fields(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Error subtree for an element of a list position
    pub fn item(&self, index: usize) -> Option<&ErrorTree> {
        match self {
            ErrorTree::Items(items) => items.get(&index),
            _ => None,
        }
    }

    /// Total number of leaf messages in the tree
    pub fn count(&self) -> usize {
        match self {
            ErrorTree::Messages(messages) => messages.len(),
            ErrorTree::Fields(fields) => fields.values().map(ErrorTree::count).sum(),
            ErrorTree::Items(items) => items.values().map(ErrorTree::count).sum(),
        }
    }

    /// Flatten into `(path, message)` pairs, e.g. `("tags.1.name", "Cannot be empty")`.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        self.flatten_into(String::new(), &mut out);
        out
    }

    fn flatten_into(&self, path: String, out: &mut Vec<(String, String)>) {
        let join = |key: &str| {
            if path.is_empty() {
                key.to_string()
            } else {
                format!("{}.{}", path, key)
            }
        };
        match self {
            ErrorTree::Messages(messages) => {
                out.extend(messages.iter().map(|m| (path.clone(), m.clone())));
            }
            ErrorTree::Fields(fields) => {
                for (name, tree) in fields {
                    tree.flatten_into(join(name), out);
                }
            }
            ErrorTree::Items(items) => {
                for (index, tree) in items {
                    tree.flatten_into(join(&index.to_string()), out);
                }
            }
        }
    }

    /// Render as the JSON error contract
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ErrorTree::Messages(messages) => serde_json::Value::from(messages.clone()),
            ErrorTree::Fields(fields) => serde_json::Value::Object(
                fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            ErrorTree::Items(items) => serde_json::Value::Object(
                items.iter().map(|(k, v)| (k.to_string(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<Vec<String>> for ErrorTree {
    fn from(messages: Vec<String>) -> Self {
        ErrorTree::Messages(messages)
    }
}
