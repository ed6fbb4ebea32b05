//! Conditional output fields.
//!
//! A resource type describes its output as [`Fields`]: an ordered list of keys
//! whose values may be present, absent, or a nested resource resolved later.
//! An absent entry never reaches the output, not even as `null`.
//!
//! ```rust,ignore
//! Ok(Fields::new()
//!     .field("id", resource.attribute("id"))
//!     .when("draft", is_admin, resource.attribute("draft"))
//!     .merge(resource.merge_when_explicitly_loaded(["author", "tags"])?))
//! ```

use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::ResourceResult;
use crate::request::Request;

use super::ResourceNode;

/// The value of one output key.
pub enum Entry<'a, E> {
    /// A value that is always present.
    Value(Value),
    /// A key that is left out of the output.
    Missing,
    /// A nested resource, resolved when the parent resolves.
    Node(Box<ResourceNode<'a, E>>),
}

impl<'a, E> Entry<'a, E> {
    /// A present value.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// A nested resource.
    pub fn node(node: ResourceNode<'a, E>) -> Self {
        Self::Node(Box::new(node))
    }

    /// Whether the entry is left out of the output.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl<E: Entity> Entry<'_, E> {
    /// Resolve to a value, or `None` when missing.
    pub fn resolve(self, request: &Request) -> ResourceResult<Option<Value>> {
        match self {
            Self::Value(value) => Ok(Some(value)),
            Self::Missing => Ok(None),
            Self::Node(node) => node.resolve(request).map(Some),
        }
    }
}

/// A group of entries merged into the parent only when `condition` holds.
pub struct Merge<'a, E> {
    condition: bool,
    entries: Vec<(String, Entry<'a, E>)>,
}

impl<'a, E> Merge<'a, E> {
    /// Create a merge group.
    pub fn new(condition: bool, entries: Vec<(String, Entry<'a, E>)>) -> Self {
        Self { condition, entries }
    }

    /// Merge the keys of a JSON object when `condition` holds.
    pub fn when(condition: bool, values: Map<String, Value>) -> Self {
        Self::new(
            condition,
            values.into_iter().map(|(k, v)| (k, Entry::Value(v))).collect(),
        )
    }

    /// A group that never merges.
    pub fn empty() -> Self {
        Self::new(false, Vec::new())
    }

    /// Whether the group is merged.
    pub fn is_active(&self) -> bool {
        self.condition
    }

    /// Keys of the group, including entries that resolve to missing.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the group has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Entry<'a, E>> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }
}

enum Field<'a, E> {
    Key(String, Entry<'a, E>),
    Merge(Merge<'a, E>),
}

/// Ordered output fields of one resource.
pub struct Fields<'a, E> {
    fields: Vec<Field<'a, E>>,
}

impl<'a, E> Fields<'a, E> {
    /// Create an empty field list.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Fields copied from the keys of a JSON object.
    ///
    /// A non-object value becomes a single `data` field.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::new().merge(Merge::when(true, map)),
            other => Self::new().field("data", other),
        }
    }

    /// Add a value that is always present.
    pub fn field(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entry(key, Entry::Value(value.into()))
    }

    /// Add a value that is present only when `condition` holds.
    pub fn when(self, key: impl Into<String>, condition: bool, value: impl Into<Value>) -> Self {
        let entry = if condition {
            Entry::Value(value.into())
        } else {
            Entry::Missing
        };
        self.entry(key, entry)
    }

    /// Add a nested resource.
    pub fn node(self, key: impl Into<String>, node: ResourceNode<'a, E>) -> Self {
        self.entry(key, Entry::node(node))
    }

    /// Add an arbitrary entry.
    pub fn entry(mut self, key: impl Into<String>, entry: Entry<'a, E>) -> Self {
        self.fields.push(Field::Key(key.into(), entry));
        self
    }

    /// Add a merge group.
    pub fn merge(mut self, merge: Merge<'a, E>) -> Self {
        self.fields.push(Field::Merge(merge));
        self
    }
}

impl<E> Default for Fields<'_, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> Fields<'_, E> {
    /// Resolve every present entry into a JSON object, in declaration order.
    pub fn resolve(self, request: &Request) -> ResourceResult<Map<String, Value>> {
        let mut data = Map::new();
        for field in self.fields {
            match field {
                Field::Key(key, entry) => insert(&mut data, key, entry, request)?,
                Field::Merge(merge) if merge.condition => {
                    for (key, entry) in merge.entries {
                        insert(&mut data, key, entry, request)?;
                    }
                }
                Field::Merge(_) => {}
            }
        }
        Ok(data)
    }
}

fn insert<E: Entity>(
    data: &mut Map<String, Value>,
    key: String,
    entry: Entry<'_, E>,
    request: &Request,
) -> ResourceResult<()> {
    if let Some(value) = entry.resolve(request)? {
        data.insert(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use serde_json::json;

    fn resolve(fields: Fields<'_, Record>) -> Value {
        Value::Object(fields.resolve(&Request::default()).unwrap())
    }

    #[test]
    fn test_missing_keys_vanish() {
        let fields = Fields::new()
            .field("id", 1)
            .when("secret", false, "hidden")
            .when("shown", true, "yes")
            .entry("gone", Entry::Missing);
        assert_eq!(resolve(fields), json!({"id": 1, "shown": "yes"}));
    }

    #[test]
    fn test_null_is_kept() {
        let fields = Fields::<Record>::new().field("deleted_at", Value::Null);
        assert_eq!(resolve(fields), json!({"deleted_at": null}));
    }

    #[test]
    fn test_inactive_merge_is_skipped() {
        let mut active = Map::new();
        active.insert("a".into(), json!(1));
        let mut inactive = Map::new();
        inactive.insert("b".into(), json!(2));

        let fields = Fields::new()
            .merge(Merge::when(true, active))
            .merge(Merge::when(false, inactive))
            .field("c", 3);
        assert_eq!(resolve(fields), json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(resolve(Fields::from_value(json!({"x": 1, "y": [2]}))), json!({"x": 1, "y": [2]}));
        assert_eq!(resolve(Fields::from_value(json!(5))), json!({"data": 5}));
    }

    #[test]
    fn test_merge_lookup() {
        let merge: Merge<'_, Record> = Merge::new(true, vec![("a".into(), Entry::Missing)]);
        assert_eq!(merge.keys().collect::<Vec<_>>(), vec!["a"]);
        assert!(merge.get("a").unwrap().is_missing());
        assert!(Merge::<Record>::empty().is_empty());
    }
}
