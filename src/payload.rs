//! Module payloads — the nested content tree and its validity check.
//!
//! A payload is a JSON object mapping unit name → sub-unit → leaf content
//! (book → chapter → verse text for a translation, term → definition for a
//! lexicon). The engine treats it as opaque except for slicing by unit path
//! and the structural validity heuristic used to detect corrupted cache
//! entries: storage corruption shows up as an empty or partially-written
//! tree, not as a parse error.

use crate::catalog::ContentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A module's content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModulePayload {
    tree: Map<String, Value>,
}

impl ModulePayload {
    /// Empty payload (the starting point for per-unit merges).
    pub fn empty() -> Self {
        Self { tree: Map::new() }
    }

    /// Wrap a JSON value; non-object values become an empty (invalid) tree,
    /// which the validity check then rejects.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(tree) => Self { tree },
            _ => Self::empty(),
        }
    }

    /// The whole tree as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.tree.clone())
    }

    /// Number of top-level units.
    pub fn unit_count(&self) -> usize {
        self.tree.len()
    }

    /// Insert or replace one top-level unit.
    pub fn insert_unit(&mut self, name: &str, content: Value) {
        self.tree.insert(name.to_string(), content);
    }

    /// Insert a sub-unit two levels deep (e.g. one chapter into one book),
    /// creating the intermediate object if needed. Used to merge lazily
    /// fetched slices into a cached tree.
    pub fn insert_subunit(&mut self, unit: &str, subunit: &str, content: Value) {
        let entry = self
            .tree
            .entry(unit.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = entry {
            map.insert(subunit.to_string(), content);
        }
    }

    /// Resolve a unit path against the tree. An empty path addresses the
    /// whole payload. Returns `None` when the path does not exist — the
    /// caller decides whether that is an error.
    pub fn slice(&self, path: &[String]) -> Option<Value> {
        if path.is_empty() {
            return Some(self.to_value());
        }
        let mut cursor = self.tree.get(&path[0])?;
        for segment in &path[1..] {
            cursor = cursor.as_object()?.get(segment)?;
        }
        Some(cursor.clone())
    }

    /// Content-type-specific structural validity check.
    ///
    /// Primary text: the top-level map must be non-empty and at least one
    /// value must itself be a non-empty map (a book with chapters).
    /// Reference content (dictionary, commentary, cross-reference, topical):
    /// any top-level keys at all.
    pub fn is_structurally_valid(&self, content_type: ContentType) -> bool {
        match content_type {
            ContentType::PrimaryText => {
                !self.tree.is_empty()
                    && self
                        .tree
                        .values()
                        .any(|v| v.as_object().is_some_and(|m| !m.is_empty()))
            }
            ContentType::Dictionary
            | ContentType::Commentary
            | ContentType::CrossReference
            | ContentType::Topical => !self.tree.is_empty(),
        }
    }
}
