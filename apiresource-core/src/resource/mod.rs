//! Serializable resource nodes.
//!
//! A [`ResourceType`] describes how one kind of entity is turned into output
//! fields. At serialization time every entity is wrapped in a [`Resource`],
//! and every collection in a [`CollectionResource`]; both carry the relation
//! paths granted to them and the shared context. Relations that are granted
//! and wrapped in a nested resource type become child [`ResourceNode`]s,
//! which resolve recursively.
//!
//! ```rust
//! use apiresource_core::relations::RelationKind;
//! use apiresource_core::resource::{Fields, Resource, ResourceType};
//! use apiresource_core::{Record, Related, Request, ResourceResult};
//!
//! struct UserResource;
//!
//! impl ResourceType<Record> for UserResource {
//!     fn to_fields<'a>(
//!         &self,
//!         resource: &Resource<'a, Record>,
//!         _request: &Request,
//!     ) -> ResourceResult<Fields<'a, Record>> {
//!         Ok(Fields::new().field("name", resource.attribute("name")))
//!     }
//! }
//!
//! struct PostResource;
//!
//! impl ResourceType<Record> for PostResource {
//!     fn to_fields<'a>(
//!         &self,
//!         resource: &Resource<'a, Record>,
//!         _request: &Request,
//!     ) -> ResourceResult<Fields<'a, Record>> {
//!         Ok(Fields::new()
//!             .field("id", resource.attribute("id"))
//!             .merge(resource.merge_when_explicitly_loaded([
//!                 apiresource_core::RelationSpec::new("author").resource(UserResource),
//!             ])?))
//!     }
//! }
//!
//! let user = Record::new("User").with_attribute("name", "Ada");
//! let post = Record::new("Post")
//!     .with_attribute("id", 1)
//!     .with_relation("author", RelationKind::BelongsTo)
//!     .with_loaded("author", Related::one(user));
//!
//! // Loaded but not granted: omitted.
//! let resource = Resource::new(&post, PostResource);
//! assert_eq!(resource.resolve(&Request::default()).unwrap(), serde_json::json!({"id": 1}));
//! ```

mod cast;
mod collection;
mod fields;
mod single;

use std::sync::Arc;

use serde_json::{Map, Value};

pub use cast::{date_format, format_date};
pub use collection::CollectionResource;
pub use fields::{Entry, Fields, Merge};
pub use single::Resource;

use crate::builder::Builder;
use crate::context::Context;
use crate::entity::{Entity, Resourceable};
use crate::error::ResourceResult;
use crate::relations::RelationPath;
use crate::request::Request;

/// Describes how an entity is serialized.
///
/// Implementations are stateless descriptions shared between every resource
/// of the type; per-pass state lives on [`Resource`] and [`CollectionResource`].
pub trait ResourceType<E>: Send + Sync + 'static {
    /// Output fields of one entity.
    ///
    /// Defaults to the entity's own JSON object.
    fn to_fields<'a>(
        &self,
        resource: &Resource<'a, E>,
        _request: &Request,
    ) -> ResourceResult<Fields<'a, E>>
    where
        E: Entity,
    {
        Ok(Fields::from_value(resource.entity().to_json()))
    }

    /// Top-level payload merged into the response next to the data.
    fn with(&self, _request: &Request) -> Map<String, Value> {
        Map::new()
    }

    /// Whether collections of this type keep the caller's keys.
    fn preserve_keys(&self) -> bool {
        false
    }

    /// Key identifying this type in a [`WrapRegistry`](crate::WrapRegistry).
    fn type_key(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Resource type that serializes entities through their own `to_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainResource;

impl<E> ResourceType<E> for PlainResource {}

/// Factory methods available on every resource type.
pub trait ResourceTypeExt<E: Entity>: ResourceType<E> + Sized {
    /// Start a builder for `resourceable`.
    fn build(self, resourceable: &mut Resourceable<E>) -> Builder<'_, E> {
        Builder::new(resourceable, self)
    }

    /// Wrap a single entity.
    fn make(self, entity: &E) -> Resource<'_, E> {
        Resource::new(entity, self)
    }

    /// Wrap a collection of entities.
    fn collection<'a, I>(self, entities: I) -> CollectionResource<'a, E>
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        CollectionResource::new(entities, self)
    }
}

impl<E: Entity, R: ResourceType<E>> ResourceTypeExt<E> for R {}

/// A node of the resource tree: one entity or a collection.
pub enum ResourceNode<'a, E> {
    /// A single entity.
    Single(Resource<'a, E>),
    /// A collection of entities.
    Many(CollectionResource<'a, E>),
}

impl<'a, E: 'static> ResourceNode<'a, E> {
    /// Whether the node wraps a single entity.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }

    /// Replace the relation paths granted to the node.
    pub fn set_relations(&mut self, relations: Vec<RelationPath>) {
        match self {
            Self::Single(resource) => resource.set_relations(relations),
            Self::Many(collection) => collection.set_relations(relations),
        }
    }

    /// Replace the context attached to the node.
    pub fn set_context(&mut self, context: Option<Context>) {
        match self {
            Self::Single(resource) => resource.set_context(context),
            Self::Many(collection) => collection.set_context(context),
        }
    }

    /// The context attached to the node.
    pub fn context(&self) -> Option<&Context> {
        match self {
            Self::Single(resource) => resource.context().context(),
            Self::Many(collection) => collection.context().context(),
        }
    }

    /// The relation paths granted to the node.
    pub fn relations(&self) -> &[RelationPath] {
        match self {
            Self::Single(resource) => resource.relations().relations(),
            Self::Many(collection) => collection.relations().relations(),
        }
    }

    /// The single resource, if this node wraps one entity.
    pub fn as_single(&self) -> Option<&Resource<'a, E>> {
        match self {
            Self::Single(resource) => Some(resource),
            Self::Many(_) => None,
        }
    }

    /// The collection resource, if this node wraps many entities.
    pub fn as_many(&self) -> Option<&CollectionResource<'a, E>> {
        match self {
            Self::Single(_) => None,
            Self::Many(collection) => Some(collection),
        }
    }
}

impl<E: Entity> ResourceNode<'_, E> {
    /// Resolve the node and its descendants.
    pub fn resolve(&self, request: &Request) -> ResourceResult<Value> {
        match self {
            Self::Single(resource) => resource.resolve(request),
            Self::Many(collection) => collection.resolve(request),
        }
    }
}

pub(crate) fn shared<E, R: ResourceType<E>>(resource_type: R) -> Arc<dyn ResourceType<E>> {
    Arc::new(resource_type)
}
