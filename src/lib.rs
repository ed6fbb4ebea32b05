//! # apiresource
//!
//! Relation-aware API resource serialization.
//!
//! apiresource provides:
//! - A builder that intersects the relations a client requested with the
//!   relations a server allows, eager-loads them and runs per-relation callbacks
//! - Nested resources that serialize a relation only when it was granted
//! - Context shared by reference across the whole resource tree
//! - Response envelopes with per-type wrap keys and pagination metadata
//!
//! ## Quick Start
//!
//! ```rust
//! use apiresource::prelude::*;
//! use serde_json::json;
//!
//! struct CommentResource;
//!
//! impl ResourceType<Record> for CommentResource {
//!     fn to_fields<'a>(
//!         &self,
//!         resource: &Resource<'a, Record>,
//!         _request: &Request,
//!     ) -> ResourceResult<Fields<'a, Record>> {
//!         Ok(Fields::new().field("body", resource.attribute("body")))
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
//!                 RelationSpec::new("comments").resource(CommentResource),
//!             ])?))
//!     }
//! }
//!
//! let loader = RecordLoader::new().resolver("Post", "comments", |_| {
//!     Related::many(vec![Record::new("Comment").with_attribute("body", "Nice")])
//! });
//!
//! let mut posts = Resourceable::Many(vec![
//!     Record::new("Post")
//!         .with_attribute("id", 1)
//!         .with_relation("comments", RelationKind::HasMany),
//! ]);
//!
//! let request = Request::from_query("/posts", "load=comments");
//! let body = PostResource
//!     .build(&mut posts)
//!     .with_loader(&loader)
//!     .with_request(&request, "load")
//!     .with_optional_relations(["comments"])?
//!     .to_array(&request)?;
//!
//! assert_eq!(body, json!([{"id": 1, "comments": [{"body": "Nice"}]}]));
//! # Ok::<(), apiresource::ResourceError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use apiresource_core::{
    Builder, Context, Entity, ErrorCode, Paginator, Record, RecordLoader, Related, RelationLoader,
    Request, RequestSource, Resource, ResourceConfig, ResourceError, ResourceResult, ResourceType,
    ResourceTypeExt, Resourceable, Response, WrapRegistry, build,
};
pub use apiresource_core::{
    builder, config, context, entity, error, logging, pagination, record, relations, request, resource,
    response, wrap,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use apiresource_core::prelude::*;
    pub use apiresource_core::{Record, RecordLoader};
}
