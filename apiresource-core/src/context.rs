//! Caller supplied context threaded through the resource tree.
//!
//! Context is an arbitrary JSON value shared by reference: the builder wraps it
//! in an [`Arc`] once and every nested resource holds a clone of that `Arc`, so
//! all nodes observe the same, unmodified value.
//!
//! ```rust
//! use apiresource_core::{Context, ContextCarrier};
//! use serde_json::json;
//!
//! let carrier = ContextCarrier::with_context(Context::new(json!({"viewer": {"id": 7}})));
//! assert_eq!(carrier.get(Some("viewer.id")), Some(&json!(7)));
//! assert_eq!(carrier.get(Some("viewer.name")), None);
//! ```

use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

/// Shared, immutable context data.
#[derive(Debug, Clone, PartialEq)]
pub struct Context(Arc<Value>);

impl Context {
    /// Wrap a value as shared context.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(Arc::new(value.into()))
    }

    /// Wrap an already shared value without copying it.
    pub fn from_shared(value: Arc<Value>) -> Self {
        Self(value)
    }

    /// The shared value.
    pub fn shared(&self) -> &Arc<Value> {
        &self.0
    }

    /// Whether two contexts point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for Context {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Context {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

impl From<Arc<Value>> for Context {
    fn from(value: Arc<Value>) -> Self {
        Self::from_shared(value)
    }
}

/// Holds the context attached to one resource node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextCarrier {
    context: Option<Context>,
}

impl ContextCarrier {
    /// Create a carrier without context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a carrier holding the given context.
    pub fn with_context(context: Context) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Replace the stored context.
    pub fn set_context(&mut self, context: Option<Context>) {
        self.context = context;
    }

    /// The stored context, if any.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Look up the context, optionally following a dotted key.
    ///
    /// Object keys and array indexes are both addressable: `users.0.name`.
    pub fn get(&self, key: Option<&str>) -> Option<&Value> {
        let value: &Value = self.context.as_deref()?;
        match key {
            Some(key) if !key.is_empty() => lookup(value, key),
            _ => Some(value),
        }
    }
}

/// Resolve a dotted key inside a JSON value.
pub fn lookup<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    key.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Loose truthiness used when deciding whether context is merged.
///
/// `null`, `false`, `0`, `""`, `"0"`, and empty arrays or objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
