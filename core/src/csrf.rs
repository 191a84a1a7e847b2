//! Anti-forgery token storage.
//!
//! # Design
//! The token lives in exactly one place. `CsrfStore` abstracts that place so
//! operations read it fresh on every call and tests can substitute their
//! own. `MetaTokenStore` stands in for the page's `csrf-token` meta element:
//! one slot behind a lock, so a refresh replaces the value in a single write
//! and later reads observe it.

use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use regex::Regex;

use crate::error::OperationError;

/// Name of the meta element carrying the token.
pub const CSRF_META_NAME: &str = "csrf-token";

/// Request header that echoes the token back to the backend.
pub const CSRF_HEADER: &str = "X-CSRFToken";

static META_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid meta tag regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("valid attribute regex")
});

/// Read/write access to the current anti-forgery token.
pub trait CsrfStore {
    /// The current token. Fails when the page carries no token at all.
    fn read(&self) -> Result<String, OperationError>;

    /// Replace the current token.
    fn write(&self, value: &str);
}

impl<S: CsrfStore + ?Sized> CsrfStore for Arc<S> {
    fn read(&self) -> Result<String, OperationError> {
        (**self).read()
    }

    fn write(&self, value: &str) {
        (**self).write(value)
    }
}

/// In-memory token slot, initialised from the server-rendered page.
#[derive(Debug, Default)]
pub struct MetaTokenStore {
    token: RwLock<Option<String>>,
}

impl MetaTokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from a page's HTML. The store is empty when the page
    /// has no `csrf-token` meta element.
    pub fn from_html(html: &str) -> Self {
        Self {
            token: RwLock::new(extract_token(html)),
        }
    }
}

impl CsrfStore for MetaTokenStore {
    fn read(&self) -> Result<String, OperationError> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| OperationError::csrf("No CSRF token present on the page"))
    }

    fn write(&self, value: &str) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(value.to_string());
    }
}

/// Find `<meta name="csrf-token" content="...">` in an HTML document and
/// return its content. Attribute order and quoting style do not matter.
pub fn extract_token(html: &str) -> Option<String> {
    META_TAG.find_iter(html).find_map(|tag| {
        let mut name = None;
        let mut content = None;
        for caps in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str());
            match caps[1].to_ascii_lowercase().as_str() {
                "name" => name = value,
                "content" => content = value,
                _ => {}
            }
        }
        match (name, content) {
            (Some(n), Some(c)) if n.eq_ignore_ascii_case(CSRF_META_NAME) => Some(c.to_string()),
            _ => None,
        }
    })
}
