//! Relation paths, specifications and the per-node relation carrier.
//!
//! This module provides the pieces the builder uses to decide which relations
//! are loaded and serialized:
//! - `RelationPath` / `RelationPathSet` for dotted paths and their set algebra
//! - `RelationSpec` for a relation name with an optional resource type and callback
//! - `RelationKind` for the cardinality metadata reported by entities
//! - `RelationCarrier` for the paths attached to one resource node
//!
//! ## Example
//!
//! ```rust
//! use apiresource_core::relations::{RelationCarrier, RelationPath};
//!
//! let carrier = RelationCarrier::with_relations(vec![
//!     RelationPath::parse("author").unwrap(),
//!     RelationPath::parse("author.profile").unwrap(),
//! ]);
//!
//! assert_eq!(carrier.top_level_relations(), vec!["author", "author"]);
//! assert_eq!(carrier.nested_relations()[0].to_dotted(), "profile");
//! ```

mod carrier;
mod path;
mod spec;

pub use carrier::RelationCarrier;
pub use path::{RelationPath, RelationPathSet, SEPARATOR, canonical_name, intersect, unnest, unnest_all};
pub use spec::{RelationCallback, RelationKind, RelationSpec};
