//! # apiresource-core
//!
//! Relation-aware resource serialization.
//!
//! This crate turns entities into JSON API output, including only the
//! relations a client explicitly asked for and the server explicitly allowed:
//! - Dotted relation paths, unnesting and intersection (`relations`)
//! - A [`Builder`] pipeline: requested/optional/explicit relations, eager
//!   loading through a [`RelationLoader`], per-relation callbacks
//! - Recursive [`Resource`] / [`CollectionResource`] trees carrying granted
//!   relations and shared [`Context`]
//! - Response envelopes with per-type wrap keys and pagination metadata
//!
//! ## Relation Paths
//!
//! ```rust
//! use apiresource_core::relations::{intersect, unnest};
//!
//! assert_eq!(unnest("a.b.c").unwrap(), vec!["a", "a.b", "a.b.c"]);
//!
//! let granted = intersect(["author.profile"], ["author"]).unwrap();
//! assert!(granted.contains("author"));
//! assert!(!granted.contains("author.profile"));
//! ```
//!
//! ## Building a Response
//!
//! ```rust
//! use apiresource_core::relations::RelationKind;
//! use apiresource_core::resource::{Fields, Resource};
//! use apiresource_core::{
//!     Record, RecordLoader, Related, Request, ResourceResult, ResourceType, ResourceTypeExt,
//!     Resourceable,
//! };
//! use serde_json::json;
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
//!             .field("title", resource.attribute("title"))
//!             .merge(resource.merge_when_explicitly_loaded(["author", "comments"])?))
//!     }
//! }
//!
//! let loader = RecordLoader::new()
//!     .resolver("Post", "author", |_| Related::one(Record::new("User").with_attribute("name", "Ada")))
//!     .resolver("Post", "comments", |_| Related::many(vec![]));
//!
//! let post = Record::new("Post")
//!     .with_attribute("title", "Hello")
//!     .with_relation("author", RelationKind::BelongsTo)
//!     .with_relation("comments", RelationKind::HasMany);
//! let mut subject = Resourceable::One(post);
//!
//! let request = Request::from_query("/posts/1", "load=author");
//! let response = PostResource
//!     .build(&mut subject)
//!     .with_loader(&loader)
//!     .with_request(&request, "load")
//!     .with_optional_relations(["author", "comments"])?
//!     .to_response(&request)?;
//!
//! assert_eq!(
//!     response.body(),
//!     &json!({"data": {"title": "Hello", "author": {"name": "Ada"}}})
//! );
//! # Ok::<(), apiresource_core::ResourceError>(())
//! ```

pub mod builder;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod logging;
pub mod pagination;
pub mod record;
pub mod relations;
pub mod request;
pub mod resource;
pub mod response;
pub mod wrap;

pub use builder::{Builder, DEFAULT_LOAD_PARAM};
pub use config::{PaginationConfig, RequestConfig, ResourceConfig, WrapSettings};
pub use context::{Context, ContextCarrier};
pub use entity::{Entity, Related, RelationLoader, Resourceable};
pub use error::{ErrorCode, ErrorContext, ResourceError, ResourceResult};
pub use pagination::Paginator;
pub use record::{Record, RecordLoader};
pub use relations::{RelationCarrier, RelationKind, RelationPath, RelationPathSet, RelationSpec};
pub use request::{Request, RequestSource};
pub use resource::{
    CollectionResource, Entry, Fields, Merge, PlainResource, Resource, ResourceNode, ResourceType,
    ResourceTypeExt,
};
pub use response::{PaginatedResourceResponse, ResourceResponse, Response};
pub use wrap::{WrapConfig, WrapRegistry};

/// Start a builder for `resourceable` serialized with `resource_type`.
pub fn build<E, R>(resourceable: &mut Resourceable<E>, resource_type: R) -> Builder<'_, E>
where
    E: Entity,
    R: ResourceType<E>,
{
    Builder::new(resourceable, resource_type)
}

/// Commonly used types.
pub mod prelude {
    pub use crate::builder::Builder;
    pub use crate::context::Context;
    pub use crate::entity::{Entity, Related, RelationLoader, Resourceable};
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::pagination::Paginator;
    pub use crate::relations::{RelationKind, RelationPath, RelationSpec};
    pub use crate::request::{Request, RequestSource};
    pub use crate::resource::{
        CollectionResource, Fields, Merge, PlainResource, Resource, ResourceType, ResourceTypeExt,
    };
    pub use crate::response::Response;
    pub use crate::wrap::WrapRegistry;
}
