//! Dotted relation paths and the set operations used to grant them.
//!
//! A relation path such as `comments.author` names a chain of relations. The
//! builder compares what a client requested with what a controller allows by
//! expanding both sides into every prefix of every path ("unnesting") and
//! intersecting the results:
//!
//! ```rust
//! use apiresource_core::relations::{intersect, unnest};
//!
//! assert_eq!(unnest("a.b.c").unwrap(), vec!["a", "a.b", "a.b.c"]);
//!
//! let granted = intersect(["author.profile"], ["author"]).unwrap();
//! assert_eq!(granted.into_iter().collect::<Vec<_>>(), vec!["author"]);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use convert_case::{Boundary, Converter};
use indexmap::IndexSet;
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::{ResourceError, ResourceResult};

/// Separator between relation path segments.
pub const SEPARATOR: char = '.';

/// An ordered, non-empty sequence of relation names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationPath {
    segments: SmallVec<[SmolStr; 4]>,
}

impl RelationPath {
    /// Parse a dotted relation path, failing on empty segments.
    pub fn parse(path: &str) -> ResourceResult<Self> {
        if path.is_empty() {
            return Err(ResourceError::invalid_relation_path(path, "path is empty"));
        }
        let segments: SmallVec<[SmolStr; 4]> = path.split(SEPARATOR).map(SmolStr::new).collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(ResourceError::invalid_relation_path(path, "path contains an empty segment"));
        }
        Ok(Self { segments })
    }

    /// Build a path from already split segments.
    pub fn from_segments<I, S>(segments: I) -> ResourceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let segments: SmallVec<[SmolStr; 4]> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|segment| segment.trim().is_empty()) {
            let joined = segments.iter().map(SmolStr::as_str).collect::<Vec<_>>().join(".");
            return Err(ResourceError::invalid_relation_path(
                joined,
                "path must have at least one non-empty segment",
            ));
        }
        Ok(Self { segments })
    }

    /// All segments in order.
    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    /// Number of segments (always at least one).
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether the path has more than one segment.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// The first segment, naming a relation of the current entity.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// The path remaining after the first segment, if any.
    pub fn tail(&self) -> Option<RelationPath> {
        if self.is_nested() {
            Some(Self {
                segments: self.segments[1..].iter().cloned().collect(),
            })
        } else {
            None
        }
    }

    /// Every prefix of this path, from the first segment up to the full path.
    pub fn prefixes(&self) -> impl Iterator<Item = RelationPath> + '_ {
        (1..=self.segments.len()).map(move |len| Self {
            segments: self.segments[..len].iter().cloned().collect(),
        })
    }

    /// The dotted string form of the path.
    pub fn to_dotted(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RelationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for RelationPath {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonicalize a client supplied relation name to camel case, segment by segment.
///
/// Only `_`, `-` and spaces separate words; existing capitals and digits are
/// kept, so `author_profile.cover-photo` becomes `authorProfile.coverPhoto`
/// while `userURL` is left alone.
pub fn canonical_name(name: &str) -> String {
    name.split(SEPARATOR)
        .map(camel_segment)
        .collect::<Vec<_>>()
        .join(".")
}

static WORDS: LazyLock<Converter> = LazyLock::new(|| {
    Converter::new()
        .set_boundaries(&[Boundary::Underscore, Boundary::Hyphen, Boundary::Space])
        .set_delim(" ")
});

fn camel_segment(segment: &str) -> String {
    let studly: String = WORDS
        .convert(segment)
        .split(' ')
        .map(|word| map_first(word, char::to_uppercase))
        .collect();
    map_first(&studly, char::to_lowercase)
}

fn map_first<I>(word: &str, map: impl Fn(char) -> I) -> String
where
    I: Iterator<Item = char>,
{
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => map(first).chain(chars).collect(),
        None => String::new(),
    }
}

/// A deduplicated, insertion-ordered set of relation paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationPathSet {
    paths: IndexSet<RelationPath>,
}

impl RelationPathSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every dotted path, failing on the first malformed one.
    pub fn parse<I, S>(paths: I) -> ResourceResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths
            .into_iter()
            .map(|path| RelationPath::parse(path.as_ref()))
            .collect()
    }

    /// Insert a path, returning whether it was new.
    pub fn insert(&mut self, path: RelationPath) -> bool {
        self.paths.insert(path)
    }

    /// Check whether the set contains a path.
    pub fn contains(&self, path: &RelationPath) -> bool {
        self.paths.contains(path)
    }

    /// Number of distinct paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over the paths in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RelationPath> {
        self.paths.iter()
    }

    /// Expand every path into all of its prefixes, deduplicated.
    pub fn unnest(&self) -> Self {
        self.paths.iter().flat_map(RelationPath::prefixes).collect()
    }

    /// Paths present in both sets after unnesting, in the order of `self`.
    pub fn intersect(&self, other: &Self) -> Self {
        let other = other.unnest();
        self.unnest()
            .paths
            .into_iter()
            .filter(|path| other.contains(path))
            .collect()
    }

    /// Dotted string form of every path.
    pub fn to_dotted(&self) -> Vec<String> {
        self.paths.iter().map(RelationPath::to_dotted).collect()
    }

    /// Consume the set into a vector of paths.
    pub fn into_vec(self) -> Vec<RelationPath> {
        self.paths.into_iter().collect()
    }
}

impl FromIterator<RelationPath> for RelationPathSet {
    fn from_iter<T: IntoIterator<Item = RelationPath>>(iter: T) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RelationPathSet {
    type Item = RelationPath;
    type IntoIter = indexmap::set::IntoIter<RelationPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

/// Every non-empty prefix of a dotted path, shortest first.
pub fn unnest(path: &str) -> ResourceResult<Vec<String>> {
    Ok(RelationPath::parse(path)?
        .prefixes()
        .map(|prefix| prefix.to_dotted())
        .collect())
}

/// Unnest every path and deduplicate the result.
pub fn unnest_all<I, S>(paths: I) -> ResourceResult<IndexSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(RelationPathSet::parse(paths)?.unnest().to_dotted().into_iter().collect())
}

/// Relations granted by intersecting the unnested requested and allowed sets.
///
/// The result follows the order of `allowed`.
pub fn intersect<R, A, S, T>(requested: R, allowed: A) -> ResourceResult<IndexSet<String>>
where
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
    A: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let requested = RelationPathSet::parse(requested)?;
    let allowed = RelationPathSet::parse(allowed)?;
    Ok(allowed.intersect(&requested).to_dotted().into_iter().collect())
}
