//! Response envelopes.
//!
//! Resolved resource data is wrapped under the wrap key of its resource type
//! and merged with the `with` payload of the type and any additional payload.
//! Paginated collections also merge the pagination `links` and `meta` objects.
//!
//! Wrapping rules for a resolved value:
//! - with a wrap key, the data is nested under it unless it already holds that key;
//! - without a wrap key, the data is nested under `data` only when there is
//!   extra payload to merge next to it;
//! - extra payload is merged recursively: objects key by key, colliding
//!   values are collected into arrays.

use serde_json::{Map, Value};

use crate::entity::Entity;
use crate::error::{ResourceError, ResourceResult};
use crate::pagination::Paginator;
use crate::request::Request;
use crate::resource::{CollectionResource, ResourceNode};
use crate::wrap::{DEFAULT_WRAP, WrapRegistry};

/// HTTP status of a normal response.
pub const STATUS_OK: u16 = 200;

/// HTTP status of a response for a newly created entity.
pub const STATUS_CREATED: u16 = 201;

/// A status code plus a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: u16,
    body: Value,
}

impl Response {
    /// Create a response.
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// The status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The JSON body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the response, returning the body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// The body as a JSON string.
    pub fn to_json_string(&self) -> ResourceResult<String> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// Wraps a resolved resource node.
pub struct ResourceResponse<'r, 'a, E> {
    node: &'r ResourceNode<'a, E>,
    wraps: &'r WrapRegistry,
    additional: Map<String, Value>,
}

impl<'r, 'a, E: Entity> ResourceResponse<'r, 'a, E> {
    /// Create a response for `node` using the wrap keys in `wraps`.
    pub fn new(node: &'r ResourceNode<'a, E>, wraps: &'r WrapRegistry) -> Self {
        Self {
            node,
            wraps,
            additional: Map::new(),
        }
    }

    /// Payload merged next to the data.
    pub fn with_additional(mut self, additional: Map<String, Value>) -> Self {
        self.additional = additional;
        self
    }

    /// Wrap key of the node: the single key for a resource, the collection key
    /// of the item type for a collection.
    pub fn wrapper(&self) -> Option<String> {
        match self.node {
            ResourceNode::Single(resource) => self.wraps.wrapper(resource.resource_type().type_key()),
            ResourceNode::Many(collection) => self
                .wraps
                .collection_wrapper(collection.resource_type().type_key()),
        }
    }

    /// 201 for a single entity created during this request, 200 otherwise.
    pub fn status(&self) -> u16 {
        match self.node {
            ResourceNode::Single(resource) if resource.was_recently_created() => STATUS_CREATED,
            _ => STATUS_OK,
        }
    }

    /// Resolve and wrap the node.
    pub fn to_response(&self, request: &Request) -> ResourceResult<Response> {
        let data = self.node.resolve(request)?;
        let with = match self.node {
            ResourceNode::Single(resource) => resource.resource_type().with(request),
            ResourceNode::Many(collection) => collection.resource_type().with(request),
        };
        let body = wrap(data, self.wrapper().as_deref(), with, self.additional.clone());
        Ok(Response::new(self.status(), body))
    }
}

/// Wraps a resolved page of a paginated collection.
pub struct PaginatedResourceResponse<'r, 'a, E> {
    collection: &'r CollectionResource<'a, E>,
    paginator: &'a Paginator<E>,
    wraps: &'r WrapRegistry,
    additional: Map<String, Value>,
}

impl<'r, 'a, E: Entity> PaginatedResourceResponse<'r, 'a, E> {
    /// Create a response for a collection built from a paginator.
    ///
    /// Fails with `UnsupportedOperation` when the collection is not paginated.
    pub fn new(collection: &'r CollectionResource<'a, E>, wraps: &'r WrapRegistry) -> ResourceResult<Self> {
        let paginator = collection.paginator().ok_or_else(|| {
            ResourceError::unsupported_operation("to_paginator", "the resource is not a paginated collection")
        })?;
        Ok(Self {
            collection,
            paginator,
            wraps,
            additional: Map::new(),
        })
    }

    /// Payload merged next to the data and the pagination information.
    pub fn with_additional(mut self, additional: Map<String, Value>) -> Self {
        self.additional = additional;
        self
    }

    /// Resolved data wrapped together with `links`, `meta`, `with` and additional payload.
    pub fn to_paginator(&self, request: &Request) -> ResourceResult<Value> {
        let data = self.collection.resolve(request)?;

        let mut info = self.paginator.pagination_information_for(request.path());
        merge_recursive(&mut info, self.collection.resource_type().with(request));
        merge_recursive(&mut info, self.additional.clone());

        let wrapper = self
            .wraps
            .collection_wrapper(self.collection.resource_type().type_key());
        Ok(wrap(data, wrapper.as_deref(), info, Map::new()))
    }

    /// The paginated body with status 200.
    pub fn to_response(&self, request: &Request) -> ResourceResult<Response> {
        Ok(Response::new(STATUS_OK, self.to_paginator(request)?))
    }
}

/// Wrap resolved data and merge the extra payload into it.
pub fn wrap(
    data: Value,
    wrapper: Option<&str>,
    with: Map<String, Value>,
    additional: Map<String, Value>,
) -> Value {
    let has_extras = !with.is_empty() || !additional.is_empty();

    let mut data = match wrapper {
        Some(key) if !has_key(&data, key) => nest(key, data),
        None if has_extras => nest(DEFAULT_WRAP, data),
        _ => data,
    };

    if let Value::Object(map) = &mut data {
        merge_recursive(map, with);
        merge_recursive(map, additional);
    }
    data
}

/// Merge `source` into `target`.
///
/// Nested objects merge key by key. When a key collides on non-object values,
/// the values are collected into one array, arrays being concatenated.
pub fn merge_recursive(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        match target.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

fn merge_value(existing: &mut Value, value: Value) {
    match (existing, value) {
        (Value::Object(target), Value::Object(source)) => merge_recursive(target, source),
        (Value::Array(target), Value::Array(source)) => target.extend(source),
        (Value::Array(target), value) => target.push(value),
        (existing, Value::Array(source)) => {
            let mut items = vec![existing.take()];
            items.extend(source);
            *existing = Value::Array(items);
        }
        (existing, value) => {
            *existing = Value::Array(vec![existing.take(), value]);
        }
    }
}

fn has_key(data: &Value, key: &str) -> bool {
    matches!(data, Value::Object(map) if map.contains_key(key))
}

fn nest(key: &str, data: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), data);
    Value::Object(map)
}
