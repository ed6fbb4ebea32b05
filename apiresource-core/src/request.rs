//! The incoming request as seen by the serialization layer.
//!
//! Only two things are read from a request: the list of relation names the
//! client asked for, and the path used to build pagination links.
//!
//! ```rust
//! use apiresource_core::{Request, RequestSource};
//!
//! let request = Request::from_query("/posts", "load=author,comments.author&page=2");
//! assert_eq!(request.requested_relations("load"), vec!["author", "comments.author"]);
//!
//! let request = Request::from_query("/posts", "load[]=author&load[]=tags");
//! assert_eq!(request.requested_relations("load"), vec!["author", "tags"]);
//! ```

/// Supplies the relation names requested by a client.
pub trait RequestSource {
    /// Relation names found under `param`, empty when absent.
    fn requested_relations(&self, param: &str) -> Vec<String>;
}

/// Default separator between relation names inside one parameter value.
pub const DEFAULT_SEPARATOR: &str = ",";

/// A request path plus its decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    path: String,
    query: Vec<(String, String)>,
    separator: String,
}

impl Request {
    /// A request for `path` without query parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// A request for `path` with a form-url-encoded query string.
    pub fn from_query(path: impl Into<String>, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut request = Self::new(path);
        request.query = url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        request
    }

    /// Add a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the separator used to split one parameter value into several names.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// First value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a parameter, accepting `key`, `key[]` and `key[n]` forms.
    pub fn params(&self, key: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| is_param(k, key))
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new("/")
    }
}

impl RequestSource for Request {
    fn requested_relations(&self, param: &str) -> Vec<String> {
        self.params(param)
            .into_iter()
            .flat_map(|value| value.split(self.separator.as_str()))
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn is_param(candidate: &str, key: &str) -> bool {
    match candidate.strip_prefix(key) {
        Some("") => true,
        Some(rest) => rest.starts_with('[') && rest.ends_with(']'),
        None => false,
    }
}
