//! Wrap keys per resource type.
//!
//! The wrap key is the top-level key under which serialized data is nested in
//! a response. Every resource type starts from the registry defaults (`data`
//! for single resources, no separate collection key) and may override them.
//! A registry is an explicit value handed to builders and responses; tests
//! can create their own or call [`WrapRegistry::reset_all`].
//!
//! ```rust
//! use apiresource_core::WrapRegistry;
//!
//! let registry = WrapRegistry::new();
//! assert_eq!(registry.wrapper("PostResource").as_deref(), Some("data"));
//!
//! registry.wrap_collection("PostResource", "posts");
//! assert_eq!(registry.collection_wrapper("PostResource").as_deref(), Some("posts"));
//!
//! registry.without_wrapping("PostResource");
//! assert_eq!(registry.wrapper("PostResource"), None);
//! assert_eq!(registry.collection_wrapper("PostResource"), None);
//! ```

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::config::ResourceConfig;

/// Default wrap key for single resources.
pub const DEFAULT_WRAP: &str = "data";

/// Wrap keys of one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapConfig {
    /// Key wrapping a single resource.
    pub wrap: Option<String>,
    /// Key wrapping a collection of this resource type.
    pub collection: Option<String>,
}

impl WrapConfig {
    /// Effective collection key: the collection key, else the single key.
    pub fn collection_key(&self) -> Option<&str> {
        self.collection.as_deref().or(self.wrap.as_deref())
    }
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            wrap: Some(DEFAULT_WRAP.to_string()),
            collection: None,
        }
    }
}

/// Registry of wrap keys keyed by resource type.
///
/// Reads and writes are synchronized, but the registry is meant to be
/// configured once at startup and only read while serializing.
#[derive(Debug, Default)]
pub struct WrapRegistry {
    defaults: WrapConfig,
    overrides: RwLock<HashMap<String, WrapConfig>>,
}

impl WrapRegistry {
    /// Create a registry with the built-in defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with custom defaults.
    pub fn with_defaults(defaults: WrapConfig) -> Self {
        Self {
            defaults,
            overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry whose defaults come from configuration.
    pub fn from_config(config: &ResourceConfig) -> Self {
        Self::with_defaults(config.wrap.to_wrap_config())
    }

    /// Defaults applied to types without overrides.
    pub fn defaults(&self) -> &WrapConfig {
        &self.defaults
    }

    /// Set both the single and collection keys of a resource type.
    pub fn wrap(&self, type_key: &str, value: impl Into<String>) {
        let value = value.into();
        self.update(type_key, |config| {
            config.wrap = Some(value.clone());
            config.collection = Some(value);
        });
    }

    /// Set only the collection key of a resource type.
    pub fn wrap_collection(&self, type_key: &str, value: impl Into<String>) {
        let value = value.into();
        self.update(type_key, |config| config.collection = Some(value));
    }

    /// Disable wrapping for a resource type.
    pub fn without_wrapping(&self, type_key: &str) {
        self.update(type_key, |config| {
            config.wrap = None;
            config.collection = None;
        });
    }

    /// `wrap` keyed by a resource type's default key.
    pub fn wrap_for<R: ?Sized>(&self, value: impl Into<String>) {
        self.wrap(std::any::type_name::<R>(), value);
    }

    /// `wrap_collection` keyed by a resource type's default key.
    pub fn wrap_collection_for<R: ?Sized>(&self, value: impl Into<String>) {
        self.wrap_collection(std::any::type_name::<R>(), value);
    }

    /// `without_wrapping` keyed by a resource type's default key.
    pub fn without_wrapping_for<R: ?Sized>(&self) {
        self.without_wrapping(std::any::type_name::<R>());
    }

    /// Effective wrap keys of a resource type.
    pub fn config_for(&self, type_key: &str) -> WrapConfig {
        self.overrides
            .read()
            .get(type_key)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    /// Key wrapping a single resource of this type.
    pub fn wrapper(&self, type_key: &str) -> Option<String> {
        self.config_for(type_key).wrap
    }

    /// Key wrapping a collection of this type.
    pub fn collection_wrapper(&self, type_key: &str) -> Option<String> {
        self.config_for(type_key).collection_key().map(str::to_string)
    }

    /// Drop the overrides of one resource type.
    pub fn reset(&self, type_key: &str) {
        self.overrides.write().remove(type_key);
    }

    /// Drop every override.
    pub fn reset_all(&self) {
        self.overrides.write().clear();
    }

    fn update(&self, type_key: &str, apply: impl FnOnce(&mut WrapConfig)) {
        let mut overrides = self.overrides.write();
        let config = overrides
            .entry(type_key.to_string())
            .or_insert_with(|| self.defaults.clone());
        apply(&mut *config);
        tracing::debug!(resource = %type_key, wrap = ?config.wrap, collection = ?config.collection, "wrap keys updated");
    }
}
