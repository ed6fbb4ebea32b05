//! A single entity wrapped in a resource type.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use smol_str::SmolStr;

use super::cast::{date_format, format_date};
use super::collection::CollectionResource;
use super::fields::{Entry, Merge};
use super::{ResourceNode, ResourceType, shared};
use crate::context::{Context, ContextCarrier, is_truthy};
use crate::entity::{Entity, Related};
use crate::error::{ResourceError, ResourceResult};
use crate::relations::{RelationCarrier, RelationPath, RelationSpec, canonical_name};
use crate::request::Request;

/// One entity plus the relations granted to it and the shared context.
pub struct Resource<'a, E> {
    entity: &'a E,
    resource_type: Arc<dyn ResourceType<E>>,
    relations: RelationCarrier,
    context: ContextCarrier,
}

impl<'a, E: 'static> Resource<'a, E> {
    /// Wrap `entity` in `resource_type`.
    pub fn new<R: ResourceType<E>>(entity: &'a E, resource_type: R) -> Self {
        Self::with_shared(entity, shared(resource_type))
    }

    /// Wrap `entity` in an already shared resource type.
    pub fn with_shared(entity: &'a E, resource_type: Arc<dyn ResourceType<E>>) -> Self {
        Self {
            entity,
            resource_type,
            relations: RelationCarrier::new(),
            context: ContextCarrier::new(),
        }
    }

    /// The wrapped entity.
    pub fn entity(&self) -> &'a E {
        self.entity
    }

    /// The resource type.
    pub fn resource_type(&self) -> &Arc<dyn ResourceType<E>> {
        &self.resource_type
    }

    /// Relation state of this node.
    pub fn relations(&self) -> &RelationCarrier {
        &self.relations
    }

    /// Replace the relation paths granted to this node.
    pub fn set_relations(&mut self, relations: Vec<RelationPath>) {
        self.relations.set_relations(relations);
    }

    /// First segment of every granted path.
    pub fn top_level_relations(&self) -> Vec<SmolStr> {
        self.relations.top_level_relations()
    }

    /// Granted paths without their first segment.
    pub fn nested_relations(&self) -> Vec<RelationPath> {
        self.relations.nested_relations()
    }

    /// Context state of this node.
    pub fn context(&self) -> &ContextCarrier {
        &self.context
    }

    /// Replace the context attached to this node.
    pub fn set_context(&mut self, context: Option<Context>) {
        self.context.set_context(context);
    }

    /// Look up the context, optionally following a dotted key.
    pub fn context_value(&self, key: Option<&str>) -> Option<&Value> {
        self.context.get(key)
    }

    /// Granted nested paths continuing below the relation `name`.
    fn nested_relations_for(&self, name: &str) -> Vec<RelationPath> {
        self.relations
            .relations()
            .iter()
            .filter(|path| path.head() == name)
            .filter_map(RelationPath::tail)
            .collect()
    }
}

impl<'a, E: Entity> Resource<'a, E> {
    /// Current value of an attribute, `null` when unset.
    pub fn attribute(&self, name: &str) -> Value {
        self.entity.attribute(name).unwrap_or(Value::Null)
    }

    /// Merge the named attributes, applying declared date formats.
    pub fn merge_attributes<I, S>(&self, names: I) -> ResourceResult<Merge<'a, E>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = Map::new();
        for name in names {
            let name = name.as_ref();
            let value = self.attribute(name);
            let value = match self.entity.cast(name).and_then(date_format) {
                Some(format) => format_date(name, &value, format)?,
                None => value,
            };
            values.insert(name.to_string(), value);
        }
        Ok(Merge::when(true, values))
    }

    /// Merge each relation only if it was granted to this node.
    ///
    /// Names are canonicalized before the check; the output key is the name as
    /// given. A granted relation with a resource type is wrapped in a nested
    /// resource or collection according to its cardinality; without one, the
    /// related entities are serialized through [`Entity::to_json`].
    pub fn merge_when_explicitly_loaded<'c, I>(&self, relations: I) -> ResourceResult<Merge<'a, E>>
    where
        I: IntoIterator,
        I::Item: Into<RelationSpec<'c, E>>,
    {
        let mut entries = Vec::new();
        for spec in relations {
            let spec: RelationSpec<'c, E> = spec.into();
            let (name, resource_type, _) = spec.into_parts();
            let canonical = canonical_name(&name);
            if !self.relations.grants(&canonical) {
                tracing::trace!(
                    entity = %self.entity.entity_name(),
                    relation = %canonical,
                    "relation not granted, omitted"
                );
                continue;
            }
            let entry = self.when_loaded(&canonical, resource_type)?;
            entries.push((name, entry));
        }
        Ok(Merge::new(true, entries))
    }

    /// The value of a relation if it is loaded, missing otherwise.
    ///
    /// Does not check whether the relation was granted. A nested node receives
    /// only the granted paths continuing below `name`, never the nested paths of
    /// sibling relations.
    pub fn when_loaded(
        &self,
        name: &str,
        resource_type: Option<Arc<dyn ResourceType<E>>>,
    ) -> ResourceResult<Entry<'a, E>> {
        let entity: &'a E = self.entity;
        let Some(related) = entity.relation(name) else {
            return Ok(Entry::Missing);
        };
        let Some(resource_type) = resource_type else {
            return Ok(Entry::Value(related.to_json()));
        };

        let mut node = match (self.is_singular_relation(name)?, related) {
            (true, Related::One(Some(item))) => {
                ResourceNode::Single(Resource::with_shared(&**item, resource_type))
            }
            (true, Related::One(None)) => return Ok(Entry::Value(Value::Null)),
            (false, Related::Many(items)) => {
                ResourceNode::Many(CollectionResource::with_shared(items.iter(), resource_type))
            }
            _ => {
                return Err(ResourceError::cardinality_mismatch(entity.entity_name(), name));
            }
        };
        node.set_relations(self.nested_relations_for(name));
        node.set_context(self.context.context().cloned());
        Ok(Entry::node(node))
    }

    /// Merge context data when the looked-up value is truthy.
    ///
    /// Objects are merged key by key; other values are merged under the last
    /// segment of `key`, or under `context` when no key is given.
    pub fn merge_context(&self, key: Option<&str>) -> Merge<'a, E> {
        let Some(value) = self.context.get(key).filter(|value| is_truthy(value)) else {
            return Merge::empty();
        };
        let values = match value {
            Value::Object(map) => map.clone(),
            other => {
                let name = key
                    .and_then(|key| key.rsplit('.').next())
                    .filter(|name| !name.is_empty())
                    .unwrap_or("context");
                let mut map = Map::new();
                map.insert(name.to_string(), other.clone());
                map
            }
        };
        Merge::when(true, values)
    }

    /// Whether `name` is a to-one relation, according to the entity's metadata.
    pub fn is_singular_relation(&self, name: &str) -> ResourceResult<bool> {
        self.entity
            .relation_kind(name)
            .map(|kind| kind.is_singular())
            .ok_or_else(|| ResourceError::missing_relation(self.entity.entity_name(), name))
    }

    /// Whether the wrapped entity was created during the current request.
    pub fn was_recently_created(&self) -> bool {
        self.entity.was_recently_created()
    }

    /// Serialize the entity and its granted relations.
    pub fn resolve(&self, request: &Request) -> ResourceResult<Value> {
        let fields = self.resource_type.to_fields(self, request)?;
        Ok(Value::Object(fields.resolve(request)?))
    }
}

impl<E: 'static> fmt::Debug for Resource<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("resource_type", &self.resource_type.type_key())
            .field("relations", &self.relations)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::relations::RelationKind;
    use crate::resource::{Fields, PlainResource};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct AuthorResource;

    impl ResourceType<Record> for AuthorResource {
        fn to_fields<'a>(
            &self,
            resource: &Resource<'a, Record>,
            _request: &Request,
        ) -> ResourceResult<Fields<'a, Record>> {
            Ok(Fields::new()
                .field("name", resource.attribute("name"))
                .merge(resource.merge_when_explicitly_loaded(["profile"])?))
        }
    }

    struct PostResource;

    impl ResourceType<Record> for PostResource {
        fn to_fields<'a>(
            &self,
            resource: &Resource<'a, Record>,
            _request: &Request,
        ) -> ResourceResult<Fields<'a, Record>> {
            Ok(Fields::new()
                .field("id", resource.attribute("id"))
                .merge(resource.merge_when_explicitly_loaded([
                    RelationSpec::new("author").resource(AuthorResource),
                    RelationSpec::new("comments"),
                ])?)
                .merge(resource.merge_context(Some("meta"))))
        }
    }

    fn post() -> Record {
        let author = Record::new("User")
            .with_attribute("name", "Ada")
            .with_relation("profile", RelationKind::HasOne)
            .with_loaded("profile", Related::one(Record::new("Profile").with_attribute("bio", "hi")));
        Record::new("Post")
            .with_attribute("id", 7)
            .with_attribute("published_at", "2024-03-05T10:20:30Z")
            .with_cast("published_at", "datetime:%d/%m/%Y")
            .with_relation("author", RelationKind::BelongsTo)
            .with_relation("comments", RelationKind::HasMany)
            .with_loaded("author", Related::one(author))
            .with_loaded(
                "comments",
                Related::many(vec![Record::new("Comment").with_attribute("body", "first")]),
            )
    }

    fn paths(paths: &[&str]) -> Vec<RelationPath> {
        paths.iter().map(|p| RelationPath::parse(p).unwrap()).collect()
    }

    #[test]
    fn test_ungranted_relations_are_omitted() {
        let post = post();
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author"]));

        let output = resource.resolve(&Request::default()).unwrap();
        assert_eq!(output, json!({"id": 7, "author": {"name": "Ada"}}));
    }

    #[test]
    fn test_nested_relations_reach_child_resource() {
        let post = post();
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author", "author.profile", "comments"]));

        let output = resource.resolve(&Request::default()).unwrap();
        assert_eq!(
            output,
            json!({
                "id": 7,
                "author": {"name": "Ada", "profile": {"bio": "hi"}},
                "comments": [{"body": "first"}],
            })
        );
    }

    #[test]
    fn test_granted_but_unloaded_is_missing() {
        let post = Record::new("Post")
            .with_attribute("id", 1)
            .with_relation("author", RelationKind::BelongsTo);
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author"]));

        assert_eq!(resource.resolve(&Request::default()).unwrap(), json!({"id": 1}));
    }

    #[test]
    fn test_empty_to_one_is_null() {
        let post = Record::new("Post")
            .with_attribute("id", 1)
            .with_relation("author", RelationKind::BelongsTo)
            .with_loaded("author", Related::none());
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author"]));

        assert_eq!(
            resource.resolve(&Request::default()).unwrap(),
            json!({"id": 1, "author": null})
        );
    }

    #[test]
    fn test_cardinality_mismatch() {
        let post = Record::new("Post")
            .with_relation("author", RelationKind::BelongsTo)
            .with_loaded("author", Related::many(vec![]));
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author"]));

        let err = resource.resolve(&Request::default()).unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::CardinalityMismatch);
    }

    #[test]
    fn test_canonical_name_check_keeps_declared_key() {
        let post = Record::new("Post")
            .with_relation("authorProfile", RelationKind::HasOne)
            .with_loaded("authorProfile", Related::one(Record::new("Profile").with_attribute("bio", "x")));
        let mut resource = Resource::new(&post, PlainResource);
        resource.set_relations(paths(&["authorProfile"]));

        let merged = resource.merge_when_explicitly_loaded(["author_profile"]).unwrap();
        let output = Fields::new().merge(merged).resolve(&Request::default()).unwrap();
        assert_eq!(Value::Object(output), json!({"author_profile": {"bio": "x"}}));
    }

    #[test]
    fn test_merge_attributes_formats_dates() {
        let post = post();
        let resource = Resource::new(&post, PlainResource);
        let merged = resource.merge_attributes(["id", "published_at", "missing"]).unwrap();
        let output = Fields::new().merge(merged).resolve(&Request::default()).unwrap();
        assert_eq!(
            Value::Object(output),
            json!({"id": 7, "published_at": "05/03/2024", "missing": null})
        );
    }

    #[test]
    fn test_merge_context() {
        let post = post();
        let mut resource = Resource::new(&post, PlainResource);
        assert!(!resource.merge_context(None).is_active());

        resource.set_context(Some(Context::new(json!({
            "meta": {"version": 2},
            "flags": {"beta": true, "off": 0},
        }))));

        let merged = resource.merge_context(Some("meta"));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["version"]);

        let merged = resource.merge_context(Some("flags.beta"));
        assert_eq!(merged.keys().collect::<Vec<_>>(), vec!["beta"]);

        assert!(!resource.merge_context(Some("flags.off")).is_active());
        assert!(!resource.merge_context(Some("absent")).is_active());
    }

    #[test]
    fn test_is_singular_relation() {
        let post = post();
        let resource = Resource::new(&post, PlainResource);
        assert!(resource.is_singular_relation("author").unwrap());
        assert!(!resource.is_singular_relation("comments").unwrap());

        let err = resource.is_singular_relation("tags").unwrap_err();
        assert_eq!(err.code, crate::ErrorCode::MissingRelation);
    }

    #[test]
    fn test_context_identity_reaches_children() {
        let post = post();
        let context = Context::new(json!({"viewer": 1}));
        let mut resource = Resource::new(&post, PostResource);
        resource.set_relations(paths(&["author"]));
        resource.set_context(Some(context.clone()));

        let entry = resource
            .when_loaded("author", Some(shared(AuthorResource)))
            .unwrap();
        let Entry::Node(node) = entry else {
            panic!("expected a nested resource");
        };
        assert!(node.is_single());
        assert!(node.context().unwrap().ptr_eq(&context));
    }
}
