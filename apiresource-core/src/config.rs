//! Configuration file parsing for `apiresource.toml`.
//!
//! ```toml
//! [request]
//! load_param = "load"
//! separator = ","
//!
//! [wrap]
//! default = "data"
//! collection = "items"
//!
//! [pagination]
//! page_name = "page"
//! ```
//!
//! Values may reference environment variables with `${VAR}`.

use std::path::Path;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, ResourceResult};
use crate::pagination::{DEFAULT_PAGE_NAME, Paginator};
use crate::request::{DEFAULT_SEPARATOR, Request};
use crate::wrap::{DEFAULT_WRAP, WrapConfig};

/// Main configuration structure for `apiresource.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceConfig {
    /// How requested relations are read from requests.
    #[serde(default)]
    pub request: RequestConfig,

    /// Default wrap keys.
    #[serde(default)]
    pub wrap: WrapSettings,

    /// Pagination link settings.
    #[serde(default)]
    pub pagination: PaginationConfig,
}

impl ResourceConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ResourceError::io(path.display().to_string(), e))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> ResourceResult<Self> {
        let expanded = expand_env_vars(content);

        let config: Self = toml::from_str(&expanded)
            .map_err(|e| ResourceError::invalid_configuration(e.to_string()).with_source(e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ResourceResult<()> {
        if self.request.load_param.trim().is_empty() {
            return Err(ResourceError::invalid_configuration("request.load_param must not be empty"));
        }
        if self.request.separator.is_empty() {
            return Err(ResourceError::invalid_configuration("request.separator must not be empty"));
        }
        if self.pagination.page_name.trim().is_empty() {
            return Err(ResourceError::invalid_configuration("pagination.page_name must not be empty"));
        }
        Ok(())
    }
}

/// Request parameter settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RequestConfig {
    /// Query parameter holding requested relation names.
    #[serde(default = "default_load_param")]
    pub load_param: String,

    /// Separator between relation names inside one parameter value.
    #[serde(default = "default_separator")]
    pub separator: String,
}

impl RequestConfig {
    /// Apply the separator to a request.
    pub fn configure(&self, request: Request) -> Request {
        request.with_separator(self.separator.as_str())
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            load_param: default_load_param(),
            separator: default_separator(),
        }
    }
}

fn default_load_param() -> String {
    "load".to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

/// Default wrap keys; an empty string disables wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WrapSettings {
    /// Key wrapping single resources.
    #[serde(default = "default_wrap")]
    pub default: String,

    /// Key wrapping collections, falling back to `default`.
    #[serde(default)]
    pub collection: Option<String>,
}

impl WrapSettings {
    /// Convert to registry defaults.
    pub fn to_wrap_config(&self) -> WrapConfig {
        WrapConfig {
            wrap: Some(self.default.clone()).filter(|key| !key.is_empty()),
            collection: self.collection.clone().filter(|key| !key.is_empty()),
        }
    }
}

impl Default for WrapSettings {
    fn default() -> Self {
        Self {
            default: default_wrap(),
            collection: None,
        }
    }
}

fn default_wrap() -> String {
    DEFAULT_WRAP.to_string()
}

/// Pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Query parameter naming the page in generated links.
    #[serde(default = "default_page_name")]
    pub page_name: String,
}

impl PaginationConfig {
    /// Apply the page name to a paginator.
    pub fn configure<E>(&self, paginator: Paginator<E>) -> Paginator<E> {
        paginator.with_page_name(self.page_name.as_str())
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_name: default_page_name(),
        }
    }
}

fn default_page_name() -> String {
    DEFAULT_PAGE_NAME.to_string()
}

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("environment variable pattern is valid"));

/// Expand `${VAR}` references; unknown variables are left untouched.
fn expand_env_vars(content: &str) -> String {
    let mut result = content.to_string();

    for cap in ENV_VAR.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
