//! Per-node relation state handed down the resource tree.

use smol_str::SmolStr;

use super::path::RelationPath;

/// The relation paths granted to one resource node.
///
/// The first segment of each path names a relation of this node's entity; the
/// remaining segments are handed to the nested resource wrapping that relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationCarrier {
    relations: Vec<RelationPath>,
}

impl RelationCarrier {
    /// Create an empty carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a carrier holding the given paths.
    pub fn with_relations(relations: Vec<RelationPath>) -> Self {
        Self { relations }
    }

    /// Replace the stored paths.
    pub fn set_relations(&mut self, relations: Vec<RelationPath>) {
        self.relations = relations;
    }

    /// The stored paths as given.
    pub fn relations(&self) -> &[RelationPath] {
        &self.relations
    }

    /// First segment of every stored path, duplicates included, in input order.
    pub fn top_level_relations(&self) -> Vec<SmolStr> {
        self.relations
            .iter()
            .map(|path| SmolStr::new(path.head()))
            .collect()
    }

    /// Every stored path without its first segment; single-segment paths drop out.
    pub fn nested_relations(&self) -> Vec<RelationPath> {
        self.relations.iter().filter_map(RelationPath::tail).collect()
    }

    /// Whether `name` is among the top-level relations.
    pub fn grants(&self, name: &str) -> bool {
        self.relations.iter().any(|path| path.head() == name)
    }

    /// Whether no relation is stored.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
