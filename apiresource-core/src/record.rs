//! In-memory entities and a resolver-based relation loader.
//!
//! [`Record`] is a dynamic entity: named attributes, optional casts, declared
//! relations and loaded relation values. [`RecordLoader`] loads relations by
//! calling a resolver registered per entity name and relation.
//!
//! ```rust
//! use apiresource_core::relations::{RelationKind, RelationPath};
//! use apiresource_core::{Entity, Record, RecordLoader, Related, RelationLoader};
//!
//! let loader = RecordLoader::new().resolver("Post", "author", |post| {
//!     Related::one(Record::new("User").with_attribute("id", post.attribute("user_id").unwrap()))
//! });
//!
//! let mut post = Record::new("Post")
//!     .with_attribute("user_id", 9)
//!     .with_relation("author", RelationKind::BelongsTo);
//! loader
//!     .load_missing(&mut [&mut post], &[RelationPath::parse("author").unwrap()])
//!     .unwrap();
//!
//! assert!(post.relation_loaded("author"));
//! assert_eq!(loader.resolved(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::entity::{Entity, Related, RelationLoader};
use crate::error::{ResourceError, ResourceResult};
use crate::relations::{RelationKind, RelationPath};

/// A dynamic entity.
///
/// [`Entity::to_json`] serializes attributes only; relations reach the output
/// through resources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    name: String,
    attributes: IndexMap<String, Value>,
    casts: IndexMap<String, String>,
    kinds: IndexMap<String, RelationKind>,
    relations: IndexMap<String, Related<Record>>,
    recently_created: bool,
}

impl Record {
    /// Create a record of the given entity name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Declare a cast for an attribute.
    pub fn with_cast(mut self, name: impl Into<String>, cast: impl Into<String>) -> Self {
        self.casts.insert(name.into(), cast.into());
        self
    }

    /// Declare a relation.
    pub fn with_relation(mut self, name: impl Into<String>, kind: RelationKind) -> Self {
        self.kinds.insert(name.into(), kind);
        self
    }

    /// Set the loaded value of a relation.
    pub fn with_loaded(mut self, name: impl Into<String>, related: Related<Record>) -> Self {
        self.set_loaded(name, related);
        self
    }

    /// Mark the record as created during the current request.
    pub fn with_recently_created(mut self, recently_created: bool) -> Self {
        self.recently_created = recently_created;
        self
    }

    /// Set an attribute in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set the loaded value of a relation in place.
    pub fn set_loaded(&mut self, name: impl Into<String>, related: Related<Record>) {
        self.relations.insert(name.into(), related);
    }

    /// Drop the loaded value of a relation.
    pub fn unload(&mut self, name: &str) -> Option<Related<Record>> {
        self.relations.shift_remove(name)
    }

    /// The entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes, in insertion order.
    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Names of the loaded relations.
    pub fn loaded_relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}

impl Entity for Record {
    fn entity_name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).cloned()
    }

    fn cast(&self, name: &str) -> Option<&str> {
        self.casts.get(name).map(String::as_str)
    }

    fn relation_kind(&self, name: &str) -> Option<RelationKind> {
        self.kinds.get(name).copied()
    }

    fn relation(&self, name: &str) -> Option<&Related<Self>> {
        self.relations.get(name)
    }

    fn relation_mut(&mut self, name: &str) -> Option<&mut Related<Self>> {
        self.relations.get_mut(name)
    }

    fn to_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<_, _>>(),
        )
    }

    fn was_recently_created(&self) -> bool {
        self.recently_created
    }
}

type Resolver = Box<dyn Fn(&Record) -> Related<Record> + Send + Sync>;

/// Loads relations of [`Record`]s through registered resolvers.
///
/// Relations already loaded are left untouched, so repeated loads of the same
/// paths resolve nothing new.
#[derive(Default)]
pub struct RecordLoader {
    resolvers: HashMap<(String, String), Resolver>,
    resolved: AtomicUsize,
}

impl RecordLoader {
    /// Create a loader without resolvers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the resolver of `relation` on entities named `entity`.
    pub fn resolver<F>(mut self, entity: impl Into<String>, relation: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&Record) -> Related<Record> + Send + Sync + 'static,
    {
        self.resolvers
            .insert((entity.into(), relation.into()), Box::new(resolve));
        self
    }

    /// Number of relation values resolved so far.
    pub fn resolved(&self) -> usize {
        self.resolved.load(Ordering::Relaxed)
    }

    fn load_path(&self, record: &mut Record, segments: &[SmolStr]) -> ResourceResult<()> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(());
        };
        let head = head.as_str();

        if record.relation_kind(head).is_none() {
            return Err(ResourceError::missing_relation(record.name(), head));
        }
        if !record.relation_loaded(head) {
            let resolve = self
                .resolvers
                .get(&(record.name.clone(), head.to_string()))
                .ok_or_else(|| {
                    ResourceError::missing_relation(record.name(), head)
                        .with_help("Register a resolver with RecordLoader::resolver")
                })?;
            let related = resolve(record);
            self.resolved.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(entity = %record.name, relation = %head, "relation resolved");
            record.set_loaded(head, related);
        }

        if !rest.is_empty() {
            if let Some(related) = record.relation_mut(head) {
                for item in related.iter_mut() {
                    self.load_path(item, rest)?;
                }
            }
        }
        Ok(())
    }
}

impl RelationLoader<Record> for RecordLoader {
    fn load_missing(&self, entities: &mut [&mut Record], relations: &[RelationPath]) -> ResourceResult<()> {
        for path in relations {
            for record in entities.iter_mut() {
                self.load_path(record, path.segments())?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for RecordLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordLoader")
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("resolved", &self.resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths(paths: &[&str]) -> Vec<RelationPath> {
        paths.iter().map(|p| RelationPath::parse(p).unwrap()).collect()
    }

    fn comment(id: i64) -> Record {
        Record::new("Comment")
            .with_attribute("id", id)
            .with_relation("author", RelationKind::BelongsTo)
    }

    fn loader() -> RecordLoader {
        RecordLoader::new()
            .resolver("Post", "comments", |_| Related::many(vec![comment(1), comment(2)]))
            .resolver("Comment", "author", |comment| {
                Related::one(Record::new("User").with_attribute("comment", comment.attribute("id").unwrap()))
            })
    }

    fn post() -> Record {
        Record::new("Post").with_relation("comments", RelationKind::HasMany)
    }

    #[test]
    fn test_to_json_is_attributes_only() {
        let record = Record::new("Post")
            .with_attribute("id", 1)
            .with_attribute("title", "Hello")
            .with_loaded("author", Related::none());
        assert_eq!(record.to_json(), json!({"id": 1, "title": "Hello"}));
    }

    #[test]
    fn test_nested_load() {
        let loader = loader();
        let mut post = post();
        loader
            .load_missing(&mut [&mut post], &paths(&["comments.author"]))
            .unwrap();

        let comments = post.relation("comments").unwrap();
        assert_eq!(comments.len(), 2);
        for comment in comments.iter() {
            assert!(comment.relation_loaded("author"));
        }
        assert_eq!(loader.resolved(), 3);
    }

    #[test]
    fn test_load_is_idempotent() {
        let loader = loader();
        let mut post = post();
        let relations = paths(&["comments", "comments.author"]);
        loader.load_missing(&mut [&mut post], &relations).unwrap();
        loader.load_missing(&mut [&mut post], &relations).unwrap();
        assert_eq!(loader.resolved(), 3);
    }

    #[test]
    fn test_undefined_relation() {
        let loader = loader();
        let mut post = post();
        let err = loader
            .load_missing(&mut [&mut post], &paths(&["editor"]))
            .unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::MissingRelation);
    }

    #[test]
    fn test_missing_resolver() {
        let loader = RecordLoader::new();
        let mut post = post();
        let err = loader
            .load_missing(&mut [&mut post], &paths(&["comments"]))
            .unwrap_err();
        assert!(err.is_relation_error());
        assert!(err.context.help.is_some());
    }
}
