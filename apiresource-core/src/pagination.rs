//! Paginated collections and the pagination metadata added to responses.
//!
//! A [`Paginator`] holds one page of entities plus the numbers needed to
//! describe the page: total count, page size and current page. Paginated
//! responses carry a `links` object and a `meta` object next to the data:
//!
//! ```rust
//! use apiresource_core::Paginator;
//! use serde_json::json;
//!
//! let page = Paginator::new(vec!["a", "b"], 5, 2, 2).with_path("/posts");
//! let info = page.pagination_information();
//!
//! assert_eq!(info["links"]["next"], json!("/posts?page=3"));
//! assert_eq!(info["meta"]["from"], json!(3));
//! assert_eq!(info["meta"]["last_page"], json!(3));
//! ```

use serde_json::{Map, Value, json};

/// Default query parameter naming the page.
pub const DEFAULT_PAGE_NAME: &str = "page";

/// One page of a length-aware paginated collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginator<E> {
    items: Vec<E>,
    total: u64,
    per_page: u64,
    current_page: u64,
    path: Option<String>,
    page_name: String,
}

impl<E> Paginator<E> {
    /// Create a page of `items` out of `total` entities.
    ///
    /// `per_page` and `current_page` are clamped to at least one.
    pub fn new(items: Vec<E>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            items,
            total,
            per_page: per_page.max(1),
            current_page: current_page.max(1),
            path: None,
            page_name: DEFAULT_PAGE_NAME.to_string(),
        }
    }

    /// Set the base path used for page links.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the query parameter naming the page.
    pub fn with_page_name(mut self, page_name: impl Into<String>) -> Self {
        self.page_name = page_name.into();
        self
    }

    /// Entities on the current page.
    pub fn items(&self) -> &[E] {
        &self.items
    }

    /// Mutable access to the entities on the current page.
    pub fn items_mut(&mut self) -> &mut [E] {
        &mut self.items
    }

    /// Total number of entities across all pages.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Page size.
    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Current page number (1-indexed).
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    /// Last page number, at least one.
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    /// Base path used for page links, `/` unless set.
    pub fn path(&self) -> &str {
        self.path.as_deref().unwrap_or("/")
    }

    /// Position of the first entity on this page, if the page is not empty.
    pub fn from(&self) -> Option<u64> {
        if self.items.is_empty() {
            None
        } else {
            Some(
                (self.current_page - 1)
                    .saturating_mul(self.per_page)
                    .saturating_add(1),
            )
        }
    }

    /// Position of the last entity on this page, if the page is not empty.
    pub fn to(&self) -> Option<u64> {
        self.from()
            .map(|from| from.saturating_add(self.items.len() as u64 - 1))
    }

    /// URL of the given page.
    pub fn url(&self, page: u64) -> String {
        page_url(self.path(), &self.page_name, page)
    }

    /// URL of the previous page, if any.
    pub fn previous_page_url(&self) -> Option<String> {
        (self.current_page > 1).then(|| self.url(self.current_page - 1))
    }

    /// URL of the next page, if any.
    pub fn next_page_url(&self) -> Option<String> {
        (self.current_page < self.last_page()).then(|| self.url(self.current_page + 1))
    }

    /// The `links` and `meta` objects describing this page.
    pub fn pagination_information(&self) -> Map<String, Value> {
        self.information_at(self.path())
    }

    /// Like [`pagination_information`](Self::pagination_information), but links
    /// point at `request_path` unless a path was set with [`with_path`](Self::with_path).
    pub fn pagination_information_for(&self, request_path: &str) -> Map<String, Value> {
        self.information_at(self.path.as_deref().unwrap_or(request_path))
    }

    fn information_at(&self, path: &str) -> Map<String, Value> {
        let url = |page: u64| page_url(path, &self.page_name, page);
        let last_page = self.last_page();

        let mut info = Map::new();
        info.insert(
            "links".to_string(),
            json!({
                "first": url(1),
                "last": url(last_page),
                "prev": (self.current_page > 1).then(|| url(self.current_page - 1)),
                "next": (self.current_page < last_page).then(|| url(self.current_page + 1)),
            }),
        );
        info.insert(
            "meta".to_string(),
            json!({
                "current_page": self.current_page,
                "from": self.from(),
                "last_page": last_page,
                "path": path,
                "per_page": self.per_page,
                "to": self.to(),
                "total": self.total,
            }),
        );
        info
    }
}

fn page_url(path: &str, page_name: &str, page: u64) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", path, separator, page_name, page.max(1))
}
