//! Relation metadata and relation specifications.

use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, Related};
use crate::resource::ResourceType;

/// Kind of relation between entities, as reported by the entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The entity holds the foreign key of its owner (e.g., Post belongs to User).
    BelongsTo,
    /// One related entity owned by this one (e.g., User has one Profile).
    HasOne,
    /// One related entity reached through an intermediate entity.
    HasOneThrough,
    /// Polymorphic one-to-one owned relation.
    MorphOne,
    /// Polymorphic inverse relation to a single owner.
    MorphTo,
    /// Many related entities owned by this one (e.g., Post has many Comments).
    HasMany,
    /// Many related entities reached through an intermediate entity.
    HasManyThrough,
    /// Many-to-many relation through a pivot (e.g., Post has many Tags).
    BelongsToMany,
    /// Polymorphic one-to-many owned relation.
    MorphMany,
    /// Polymorphic many-to-many relation.
    MorphToMany,
}

impl RelationKind {
    /// Check if this relation resolves to a single entity.
    pub fn is_singular(&self) -> bool {
        matches!(
            self,
            Self::BelongsTo | Self::HasOne | Self::HasOneThrough | Self::MorphOne | Self::MorphTo
        )
    }

    /// Check if this relation resolves to a collection of entities.
    pub fn is_plural(&self) -> bool {
        !self.is_singular()
    }
}

/// Function run against the resolved value of a relation before serialization.
pub type RelationCallback<'c, E> = Box<dyn FnMut(&mut Related<E>) + 'c>;

/// A relation name plus an optional nested resource type and callback.
///
/// Builders read the name and callback; resources read the name and resource type.
///
/// ```rust,ignore
/// let spec = RelationSpec::new("comments")
///     .resource(CommentResource)
///     .callback(|comments| comments.retain(|c| c.attribute("approved") == Some(true.into())));
/// ```
pub struct RelationSpec<'c, E> {
    name: String,
    resource: Option<Arc<dyn ResourceType<E>>>,
    callback: Option<RelationCallback<'c, E>>,
}

impl<'c, E: Entity> RelationSpec<'c, E> {
    /// Create a spec for a dotted relation name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource: None,
            callback: None,
        }
    }

    /// Wrap the loaded relation in the given resource type.
    pub fn resource<R: ResourceType<E>>(self, resource: R) -> Self {
        self.shared_resource(Arc::new(resource))
    }

    /// Wrap the loaded relation in an already shared resource type.
    pub fn shared_resource(mut self, resource: Arc<dyn ResourceType<E>>) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Run a callback against the resolved relation before serialization.
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&mut Related<E>) + 'c,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// The relation name as given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nested resource type, if any.
    pub fn resource_type(&self) -> Option<&Arc<dyn ResourceType<E>>> {
        self.resource.as_ref()
    }

    /// Whether a callback is attached.
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Split into name, resource type and callback.
    pub fn into_parts(
        self,
    ) -> (
        String,
        Option<Arc<dyn ResourceType<E>>>,
        Option<RelationCallback<'c, E>>,
    ) {
        (self.name, self.resource, self.callback)
    }
}

impl<E: 'static> fmt::Debug for RelationSpec<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationSpec")
            .field("name", &self.name)
            .field("resource", &self.resource.as_ref().map(|r| r.type_key()))
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl<E: Entity> From<&str> for RelationSpec<'_, E> {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl<E: Entity> From<String> for RelationSpec<'_, E> {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl<E: Entity> From<&String> for RelationSpec<'_, E> {
    fn from(name: &String) -> Self {
        Self::new(name.as_str())
    }
}

impl<E: Entity, R: ResourceType<E>> From<(&str, R)> for RelationSpec<'_, E> {
    fn from((name, resource): (&str, R)) -> Self {
        Self::new(name).resource(resource)
    }
}
