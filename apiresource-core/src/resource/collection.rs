//! A collection of entities wrapped in a resource type.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::single::Resource;
use super::{ResourceType, shared};
use crate::context::{Context, ContextCarrier};
use crate::entity::Entity;
use crate::error::ResourceResult;
use crate::pagination::Paginator;
use crate::relations::{RelationCarrier, RelationPath};
use crate::request::Request;

/// A collection of item resources sharing one resource type.
///
/// Relations and context set on the collection are handed to every item.
pub struct CollectionResource<'a, E> {
    items: Vec<(Option<String>, Resource<'a, E>)>,
    resource_type: Arc<dyn ResourceType<E>>,
    relations: RelationCarrier,
    context: ContextCarrier,
    preserve_keys: bool,
    paginator: Option<&'a Paginator<E>>,
}

impl<'a, E: 'static> CollectionResource<'a, E> {
    /// Wrap every entity in `resource_type`.
    pub fn new<I, R>(entities: I, resource_type: R) -> Self
    where
        I: IntoIterator<Item = &'a E>,
        R: ResourceType<E>,
    {
        Self::with_shared(entities, shared(resource_type))
    }

    /// Wrap every entity in an already shared resource type.
    pub fn with_shared<I>(entities: I, resource_type: Arc<dyn ResourceType<E>>) -> Self
    where
        I: IntoIterator<Item = &'a E>,
    {
        Self::from_items(
            entities.into_iter().map(|entity| (None, entity)),
            resource_type,
        )
    }

    /// Wrap keyed entities; keys are kept in the output when the type preserves keys.
    pub fn keyed<I, K>(entities: I, resource_type: Arc<dyn ResourceType<E>>) -> Self
    where
        I: IntoIterator<Item = (K, &'a E)>,
        K: Into<String>,
    {
        Self::from_items(
            entities.into_iter().map(|(key, entity)| (Some(key.into()), entity)),
            resource_type,
        )
    }

    /// Wrap the current page of a paginator.
    pub fn paginated(paginator: &'a Paginator<E>, resource_type: Arc<dyn ResourceType<E>>) -> Self {
        let mut collection = Self::with_shared(paginator.items(), resource_type);
        collection.paginator = Some(paginator);
        collection
    }

    fn from_items<I>(items: I, resource_type: Arc<dyn ResourceType<E>>) -> Self
    where
        I: Iterator<Item = (Option<String>, &'a E)>,
    {
        let items = items
            .map(|(key, entity)| (key, Resource::with_shared(entity, Arc::clone(&resource_type))))
            .collect();
        let mut collection = Self {
            items,
            resource_type,
            relations: RelationCarrier::new(),
            context: ContextCarrier::new(),
            preserve_keys: false,
            paginator: None,
        };
        collection.sync_preserve_keys();
        collection
    }
}

impl<'a, E: 'static> CollectionResource<'a, E> {
    /// The item resource type.
    pub fn resource_type(&self) -> &Arc<dyn ResourceType<E>> {
        &self.resource_type
    }

    /// Item resources with their keys.
    pub fn items(&self) -> impl Iterator<Item = (Option<&str>, &Resource<'a, E>)> {
        self.items.iter().map(|(key, item)| (key.as_deref(), item))
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The paginator this collection was built from, if any.
    pub fn paginator(&self) -> Option<&'a Paginator<E>> {
        self.paginator
    }

    /// Whether item keys are kept in the output.
    pub fn preserves_keys(&self) -> bool {
        self.preserve_keys
    }

    /// Relation state of the collection.
    pub fn relations(&self) -> &RelationCarrier {
        &self.relations
    }

    /// Context state of the collection.
    pub fn context(&self) -> &ContextCarrier {
        &self.context
    }

    /// Replace the relation paths of the collection and every item.
    pub fn set_relations(&mut self, relations: Vec<RelationPath>) {
        for (_, item) in &mut self.items {
            item.set_relations(relations.clone());
        }
        self.relations.set_relations(relations);
        self.sync_preserve_keys();
    }

    /// Replace the context of the collection and every item.
    pub fn set_context(&mut self, context: Option<Context>) {
        for (_, item) in &mut self.items {
            item.set_context(context.clone());
        }
        self.context.set_context(context);
        self.sync_preserve_keys();
    }

    /// Take the key preservation flag from the first item's type.
    fn sync_preserve_keys(&mut self) {
        if let Some((_, first)) = self.items.first() {
            self.preserve_keys = first.resource_type().preserve_keys();
        }
    }
}

impl<E: Entity> CollectionResource<'_, E> {
    /// Serialize every item: an array, or an object when keys are preserved.
    pub fn resolve(&self, request: &Request) -> ResourceResult<Value> {
        let keyed = self.preserve_keys && self.items.iter().all(|(key, _)| key.is_some());
        if keyed {
            let mut data = Map::new();
            for (key, item) in &self.items {
                data.insert(key.clone().unwrap_or_default(), item.resolve(request)?);
            }
            return Ok(Value::Object(data));
        }

        self.items
            .iter()
            .map(|(_, item)| item.resolve(request))
            .collect::<ResourceResult<Vec<_>>>()
            .map(Value::Array)
    }
}

impl<E: 'static> fmt::Debug for CollectionResource<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionResource")
            .field("resource_type", &self.resource_type.type_key())
            .field("len", &self.items.len())
            .field("relations", &self.relations)
            .field("preserve_keys", &self.preserve_keys)
            .field("paginated", &self.paginator.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::resource::PlainResource;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct KeyedResource;

    impl ResourceType<Record> for KeyedResource {
        fn preserve_keys(&self) -> bool {
            true
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::new("Tag").with_attribute("name", "rust"),
            Record::new("Tag").with_attribute("name", "api"),
        ]
    }

    #[test]
    fn test_relations_and_context_reach_every_item() {
        let tags = records();
        let mut collection = CollectionResource::new(&tags, PlainResource);
        let context = Context::new(json!({"locale": "en"}));
        collection.set_relations(vec![
            RelationPath::parse("a").unwrap(),
            RelationPath::parse("a.b").unwrap(),
        ]);
        collection.set_context(Some(context.clone()));

        for (_, item) in collection.items() {
            assert_eq!(item.top_level_relations(), vec!["a", "a"]);
            assert_eq!(item.nested_relations(), vec![RelationPath::parse("b").unwrap()]);
            assert!(item.context().context().unwrap().ptr_eq(&context));
        }
    }

    #[test]
    fn test_resolves_to_array() {
        let tags = records();
        let collection = CollectionResource::new(&tags, PlainResource);
        assert_eq!(
            collection.resolve(&Request::default()).unwrap(),
            json!([{"name": "rust"}, {"name": "api"}])
        );
    }

    #[test]
    fn test_keys_preserved_from_item_type() {
        let tags = records();
        let keyed = tags.iter().enumerate().map(|(i, tag)| (format!("t{i}"), tag));
        let collection = CollectionResource::keyed(keyed, shared(KeyedResource));
        assert!(collection.preserves_keys());
        assert_eq!(
            collection.resolve(&Request::default()).unwrap(),
            json!({"t0": {"name": "rust"}, "t1": {"name": "api"}})
        );

        let keyed = tags.iter().map(|tag| ("k", tag));
        let collection = CollectionResource::keyed(keyed, shared(PlainResource));
        assert!(!collection.preserves_keys());
        assert!(collection.resolve(&Request::default()).unwrap().is_array());
    }

    #[test]
    fn test_paginated_collection() {
        let page = Paginator::new(records(), 2, 10, 1);
        let collection = CollectionResource::paginated(&page, shared(PlainResource));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.paginator().map(Paginator::total), Some(2));
    }
}
