//! Collaborator traits for the entities being serialized.
//!
//! The core never talks to a database. It consumes:
//! - [`Entity`] for attribute reads, casts, relation metadata and loaded relations
//! - [`RelationLoader`] for eager-loading a flat list of relation paths
//!
//! and serializes a [`Resourceable`]: a single entity, a plain or keyed
//! collection, or a paginated collection.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::ResourceResult;
use crate::pagination::Paginator;
use crate::relations::{RelationKind, RelationPath};

/// An entity whose attributes and relations can be serialized.
///
/// Related entities share the implementing type, so a dynamic record type or
/// an enum over typed models both fit.
pub trait Entity: Sized + 'static {
    /// Name of the entity type, used in error messages.
    fn entity_name(&self) -> &str;

    /// Current value of an attribute, or `None` if it is not set.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Declared cast for an attribute, e.g. `datetime:%Y-%m-%d`.
    fn cast(&self, _name: &str) -> Option<&str> {
        None
    }

    /// Relation metadata, or `None` if the entity does not define `name`.
    fn relation_kind(&self, name: &str) -> Option<RelationKind>;

    /// The loaded value of a relation, or `None` if it has not been loaded.
    fn relation(&self, name: &str) -> Option<&Related<Self>>;

    /// Mutable access to the loaded value of a relation.
    fn relation_mut(&mut self, name: &str) -> Option<&mut Related<Self>>;

    /// Plain serialization of the entity, used when no resource type applies.
    fn to_json(&self) -> Value;

    /// Whether the entity was created during the current request.
    fn was_recently_created(&self) -> bool {
        false
    }

    /// Whether a relation is currently loaded.
    fn relation_loaded(&self, name: &str) -> bool {
        self.relation(name).is_some()
    }
}

/// The loaded value of a relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Related<E> {
    /// A to-one relation; `None` when no related entity exists.
    One(Option<Box<E>>),
    /// A to-many relation.
    Many(Vec<E>),
}

impl<E> Related<E> {
    /// A to-one relation holding `entity`.
    pub fn one(entity: E) -> Self {
        Self::One(Some(Box::new(entity)))
    }

    /// A to-one relation with no related entity.
    pub fn none() -> Self {
        Self::One(None)
    }

    /// A to-many relation.
    pub fn many(entities: Vec<E>) -> Self {
        Self::Many(entities)
    }

    /// Number of related entities.
    pub fn len(&self) -> usize {
        match self {
            Self::One(entity) => usize::from(entity.is_some()),
            Self::Many(entities) => entities.len(),
        }
    }

    /// Whether there is no related entity.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single related entity of a to-one relation.
    pub fn as_one(&self) -> Option<&E> {
        match self {
            Self::One(entity) => entity.as_deref(),
            Self::Many(_) => None,
        }
    }

    /// The related entities of a to-many relation.
    pub fn as_many(&self) -> Option<&[E]> {
        match self {
            Self::One(_) => None,
            Self::Many(entities) => Some(entities),
        }
    }

    /// Iterate over related entities, treating a to-one value as a collection of one.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        let (one, many) = match self {
            Self::One(entity) => (entity.as_deref(), <&[E]>::default()),
            Self::Many(entities) => (None, entities.as_slice()),
        };
        one.into_iter().chain(many.iter())
    }

    /// Mutable iteration over related entities.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut E> {
        let (one, many) = match self {
            Self::One(entity) => (entity.as_deref_mut(), <&mut [E]>::default()),
            Self::Many(entities) => (None, entities.as_mut_slice()),
        };
        one.into_iter().chain(many.iter_mut())
    }

    /// Keep only the related entities matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) {
        match self {
            Self::One(entity) => {
                if entity.as_deref().is_some_and(|e| !keep(e)) {
                    *entity = None;
                }
            }
            Self::Many(entities) => entities.retain(|e| keep(e)),
        }
    }
}

impl<E: Entity> Related<E> {
    /// Plain serialization: an object, `null`, or an array.
    pub fn to_json(&self) -> Value {
        match self {
            Self::One(Some(entity)) => entity.to_json(),
            Self::One(None) => Value::Null,
            Self::Many(entities) => Value::Array(entities.iter().map(Entity::to_json).collect()),
        }
    }
}

/// Eager-loads relation paths on a set of entities.
///
/// Implementations must skip relations that are already loaded and must
/// support dotted paths. Failures, including undefined relations, are
/// returned unchanged to the caller of the builder.
pub trait RelationLoader<E> {
    /// Load every path in `relations` that is not yet loaded on `entities`.
    fn load_missing(&self, entities: &mut [&mut E], relations: &[RelationPath]) -> ResourceResult<()>;
}

impl<E, F> RelationLoader<E> for F
where
    F: Fn(&mut [&mut E], &[RelationPath]) -> ResourceResult<()>,
{
    fn load_missing(&self, entities: &mut [&mut E], relations: &[RelationPath]) -> ResourceResult<()> {
        self(entities, relations)
    }
}

/// The subject of a serialization pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Resourceable<E> {
    /// A single entity.
    One(E),
    /// A collection of entities.
    Many(Vec<E>),
    /// A collection whose keys are kept when the resource type preserves keys.
    Keyed(IndexMap<String, E>),
    /// One page of a paginated collection.
    Paginated(Paginator<E>),
}

impl<E> Resourceable<E> {
    /// Whether the subject is a single entity.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// Whether the subject is a paginated collection.
    pub fn is_paginated(&self) -> bool {
        matches!(self, Self::Paginated(_))
    }

    /// Number of entities held.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
            Self::Keyed(items) => items.len(),
            Self::Paginated(page) => page.items().len(),
        }
    }

    /// Whether no entity is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Mutable references to every entity, in order.
    ///
    /// For a paginator this reaches the entities of the current page only; the
    /// pagination state itself is left untouched.
    pub fn entities_mut(&mut self) -> Vec<&mut E> {
        match self {
            Self::One(entity) => vec![entity],
            Self::Many(items) => items.iter_mut().collect(),
            Self::Keyed(items) => items.values_mut().collect(),
            Self::Paginated(page) => page.items_mut().iter_mut().collect(),
        }
    }

    /// The paginator, if the subject is paginated.
    pub fn paginator(&self) -> Option<&Paginator<E>> {
        match self {
            Self::Paginated(page) => Some(page),
            _ => None,
        }
    }
}

impl<E> From<Vec<E>> for Resourceable<E> {
    fn from(items: Vec<E>) -> Self {
        Self::Many(items)
    }
}

impl<E> From<Paginator<E>> for Resourceable<E> {
    fn from(page: Paginator<E>) -> Self {
        Self::Paginated(page)
    }
}
