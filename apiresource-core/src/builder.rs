//! The request-to-response pipeline.
//!
//! A [`Builder`] collects relation specs and context for one serialization
//! pass, eager-loads the effective relations, runs relation callbacks, and
//! hands the result to a fresh resource tree.
//!
//! ```rust
//! use apiresource_core::relations::RelationKind;
//! use apiresource_core::{Builder, PlainResource, Record, Related, Request, Resourceable};
//!
//! let post = Record::new("Post")
//!     .with_attribute("id", 1)
//!     .with_relation("author", RelationKind::BelongsTo)
//!     .with_relation("comments", RelationKind::HasMany)
//!     .with_loaded("author", Related::one(Record::new("User").with_attribute("name", "Ada")));
//! let mut subject = Resourceable::One(post);
//!
//! let request = Request::from_query("/posts/1", "load=author,comments");
//! let mut builder = Builder::new(&mut subject, PlainResource)
//!     .with_request(&request, "load")
//!     .with_optional_relations(["author"])
//!     .unwrap();
//!
//! builder.prepare().unwrap();
//! assert_eq!(builder.effective_relations().len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::config::ResourceConfig;
use crate::context::Context;
use crate::entity::{Entity, Related, RelationLoader, Resourceable};
use crate::error::{ResourceError, ResourceResult};
use crate::relations::{RelationCallback, RelationPath, RelationPathSet, RelationSpec, canonical_name};
use crate::request::{Request, RequestSource};
use crate::resource::{CollectionResource, Resource, ResourceNode, ResourceType, shared};
use crate::response::{PaginatedResourceResponse, ResourceResponse, Response};
use crate::wrap::WrapRegistry;

/// Default query parameter holding requested relation names.
pub const DEFAULT_LOAD_PARAM: &str = "load";

/// Builds the resource tree for one serialization pass.
///
/// The builder borrows the subject mutably: eager loading and relation
/// callbacks modify the entities in place.
pub struct Builder<'a, E: Entity> {
    resourceable: &'a mut Resourceable<E>,
    resource_type: Arc<dyn ResourceType<E>>,
    loader: Option<&'a dyn RelationLoader<E>>,
    wraps: Option<&'a WrapRegistry>,
    ambient_request: Option<&'a dyn RequestSource>,
    load_param: String,
    requested: Option<Vec<String>>,
    relations: Vec<RelationPath>,
    callbacks: IndexMap<RelationPath, RelationCallback<'a, E>>,
    context: Option<Context>,
    additional: Map<String, Value>,
    prepared: Vec<RelationPath>,
}

impl<'a, E: Entity> Builder<'a, E> {
    /// Start a builder for `resourceable` serialized with `resource_type`.
    pub fn new<R: ResourceType<E>>(resourceable: &'a mut Resourceable<E>, resource_type: R) -> Self {
        Self::with_shared(resourceable, shared(resource_type))
    }

    /// Start a builder with an already shared resource type.
    pub fn with_shared(resourceable: &'a mut Resourceable<E>, resource_type: Arc<dyn ResourceType<E>>) -> Self {
        Self {
            resourceable,
            resource_type,
            loader: None,
            wraps: None,
            ambient_request: None,
            load_param: DEFAULT_LOAD_PARAM.to_string(),
            requested: None,
            relations: Vec::new(),
            callbacks: IndexMap::new(),
            context: None,
            additional: Map::new(),
            prepared: Vec::new(),
        }
    }

    /// Eager-load relations through `loader`. Without a loader, relations
    /// must already be loaded on the entities.
    pub fn with_loader(mut self, loader: &'a dyn RelationLoader<E>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Wrap keys used by [`to_response`](Self::to_response) and [`to_paginator`](Self::to_paginator).
    pub fn with_wraps(mut self, wraps: &'a WrapRegistry) -> Self {
        self.wraps = Some(wraps);
        self
    }

    /// Request consulted when optional relations are declared before any
    /// requested relations.
    pub fn with_ambient_request(mut self, request: &'a dyn RequestSource) -> Self {
        self.ambient_request = Some(request);
        self
    }

    /// Take the load parameter from configuration.
    pub fn with_config(mut self, config: &ResourceConfig) -> Self {
        self.load_param = config.request.load_param.clone();
        self
    }

    /// Add the relation names found under `param` in `request`.
    pub fn with_request(self, request: &dyn RequestSource, param: &str) -> Self {
        let names = request.requested_relations(param);
        self.with_requested_relations(names)
    }

    /// Add requested relation names, canonicalized to camel case.
    ///
    /// Marks the requested set as populated even when `names` is empty, so the
    /// ambient request is no longer consulted. Malformed names are dropped.
    pub fn with_requested_relations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let requested = self.requested.get_or_insert_with(Vec::new);
        for name in names {
            let name = name.as_ref();
            match RelationPath::parse(name) {
                Ok(_) => requested.push(canonical_name(name)),
                Err(err) => tracing::warn!(relation = %name, error = %err, "dropping malformed requested relation"),
            }
        }
        self
    }

    /// Add relations that are always loaded and granted.
    pub fn with_relations<I>(mut self, specs: I) -> ResourceResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<RelationSpec<'a, E>>,
    {
        let paths = self.extract_callbacks(specs)?;
        self.relations.extend(paths);
        Ok(self)
    }

    /// Add relations that are granted only when requested.
    ///
    /// Grants every unnested prefix present in both the requested and the
    /// optional sets.
    pub fn with_optional_relations<I>(mut self, specs: I) -> ResourceResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<RelationSpec<'a, E>>,
    {
        let optional: RelationPathSet = self.extract_callbacks(specs)?.into_iter().collect();

        if self.requested.is_none() {
            self = match self.ambient_request {
                Some(request) => {
                    let param = self.load_param.clone();
                    self.with_request(request, &param)
                }
                None => self.with_requested_relations(std::iter::empty::<&str>()),
            };
        }

        let requested = RelationPathSet::parse(self.requested.iter().flatten())?;
        let granted = optional.unnest().intersect(&requested.unnest());
        tracing::debug!(granted = ?granted.to_dotted(), "optional relations granted");

        self.relations.extend(granted);
        Ok(self)
    }

    /// Attach context shared by every node of the resource tree.
    pub fn with_context(mut self, context: impl Into<Context>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Payload merged next to the data in responses.
    pub fn with_additional(mut self, additional: Map<String, Value>) -> Self {
        self.additional = additional;
        self
    }

    /// Relation names requested so far, if the requested set was populated.
    pub fn requested_relations(&self) -> Option<&[String]> {
        self.requested.as_deref()
    }

    /// Relations collected so far, before deduplication.
    pub fn relations(&self) -> &[RelationPath] {
        &self.relations
    }

    /// Relations attached to the resource tree by the last [`prepare`](Self::prepare).
    pub fn effective_relations(&self) -> &[RelationPath] {
        &self.prepared
    }

    /// The attached context.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Deduplicate relations, eager-load them and run relation callbacks.
    ///
    /// Safe to call repeatedly; every call recomputes from the collected
    /// relations.
    pub fn prepare(&mut self) -> ResourceResult<()> {
        let relations: Vec<RelationPath> = self
            .relations
            .iter()
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        tracing::debug!(
            relations = ?relations.iter().map(RelationPath::to_dotted).collect::<Vec<_>>(),
            "preparing resource"
        );

        self.load_missing(&relations)?;
        self.apply_callbacks(&relations)?;

        self.prepared = relations;
        Ok(())
    }

    fn load_missing(&mut self, relations: &[RelationPath]) -> ResourceResult<()> {
        let Some(loader) = self.loader else {
            tracing::debug!("no relation loader, skipping eager load");
            return Ok(());
        };

        let mut entities = self.resourceable.entities_mut();
        if entities.is_empty() {
            tracing::debug!("empty collection, skipping eager load");
            return Ok(());
        }
        loader.load_missing(&mut entities, relations)
    }

    fn apply_callbacks(&mut self, relations: &[RelationPath]) -> ResourceResult<()> {
        for path in relations {
            let Some(callback) = self.callbacks.get_mut(path) else {
                continue;
            };
            tracing::debug!(relation = %path, "applying relation callback");
            for entity in self.resourceable.entities_mut() {
                apply_callback(entity, path.segments(), &mut **callback)?;
            }
        }
        Ok(())
    }

    /// Parse specs into paths, keeping their callbacks aside.
    fn extract_callbacks<I>(&mut self, specs: I) -> ResourceResult<Vec<RelationPath>>
    where
        I: IntoIterator,
        I::Item: Into<RelationSpec<'a, E>>,
    {
        let mut paths = Vec::new();
        for spec in specs {
            let spec: RelationSpec<'a, E> = spec.into();
            let (name, _, callback) = spec.into_parts();
            let path = RelationPath::parse(&name)?;
            if let Some(callback) = callback {
                self.callbacks.insert(path.clone(), callback);
            }
            paths.push(path);
        }
        Ok(paths)
    }

    /// A fresh resource tree over the subject, carrying the prepared state.
    pub fn resource(&self) -> ResourceNode<'_, E> {
        let resource_type = Arc::clone(&self.resource_type);
        let mut node = match &*self.resourceable {
            Resourceable::One(entity) => ResourceNode::Single(Resource::with_shared(entity, resource_type)),
            Resourceable::Many(items) => {
                ResourceNode::Many(CollectionResource::with_shared(items, resource_type))
            }
            Resourceable::Keyed(items) => ResourceNode::Many(CollectionResource::keyed(
                items.iter().map(|(key, entity)| (key.as_str(), entity)),
                resource_type,
            )),
            Resourceable::Paginated(page) => {
                ResourceNode::Many(CollectionResource::paginated(page, resource_type))
            }
        };
        node.set_relations(self.prepared.clone());
        node.set_context(self.context.clone());
        node
    }

    /// Prepare and resolve the resource tree without wrapping.
    pub fn to_array(&mut self, request: &Request) -> ResourceResult<Value> {
        self.prepare()?;
        self.resource().resolve(request)
    }

    /// Prepare and produce the wrapped response.
    ///
    /// Paginated subjects produce a paginated response.
    pub fn to_response(&mut self, request: &Request) -> ResourceResult<Response> {
        self.prepare()?;
        let default_wraps = WrapRegistry::new();
        let wraps = self.wraps.unwrap_or(&default_wraps);
        let node = self.resource();

        match &node {
            ResourceNode::Many(collection) if collection.paginator().is_some() => {
                PaginatedResourceResponse::new(collection, wraps)?
                    .with_additional(self.additional.clone())
                    .to_response(request)
            }
            _ => ResourceResponse::new(&node, wraps)
                .with_additional(self.additional.clone())
                .to_response(request),
        }
    }

    /// Prepare and produce the paginated body.
    ///
    /// Fails with `UnsupportedOperation` unless the subject is paginated.
    pub fn to_paginator(&mut self, request: &Request) -> ResourceResult<Value> {
        if !self.resourceable.is_paginated() {
            return Err(ResourceError::unsupported_operation(
                "to_paginator",
                "the resource is not a paginated collection",
            )
            .with_help("Serialize a Resourceable::Paginated subject, or use to_response"));
        }
        self.prepare()?;
        let default_wraps = WrapRegistry::new();
        let wraps = self.wraps.unwrap_or(&default_wraps);
        let node = self.resource();
        let ResourceNode::Many(collection) = &node else {
            return Err(ResourceError::internal("paginated subject produced a single resource"));
        };
        PaginatedResourceResponse::new(collection, wraps)?
            .with_additional(self.additional.clone())
            .to_paginator(request)
    }
}

/// Run `callback` on the relation at the end of `path`, walking every entity
/// along the way.
fn apply_callback<E: Entity>(
    entity: &mut E,
    path: &[smol_str::SmolStr],
    callback: &mut dyn FnMut(&mut Related<E>),
) -> ResourceResult<()> {
    let Some((head, rest)) = path.split_first() else {
        return Ok(());
    };
    if entity.relation_kind(head).is_none() {
        return Err(ResourceError::missing_relation(entity.entity_name(), head.as_str()));
    }
    let entity_name = entity.entity_name().to_string();
    let related = entity
        .relation_mut(head)
        .ok_or_else(|| ResourceError::relation_not_loaded(entity_name, head.as_str()))?;

    if rest.is_empty() {
        callback(related);
        return Ok(());
    }
    for item in related.iter_mut() {
        apply_callback(item, rest, callback)?;
    }
    Ok(())
}

impl<E: Entity> fmt::Debug for Builder<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("resource_type", &self.resource_type.type_key())
            .field("requested", &self.requested)
            .field("relations", &self.relations)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .field("context", &self.context)
            .field("prepared", &self.prepared)
            .finish_non_exhaustive()
    }
}
