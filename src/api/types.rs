//! Declarative request descriptions and response types

use std::{fmt, marker::PhantomData};

use reqwest::Method;

use crate::model::{Account, SearchResults};

/// A request description for an API endpoint whose response decodes to `M`.
///
/// Building a request never touches the network, it is executed by a [`Client`](super::Client).
pub struct Request<M> {
    /// path relative to the instance base url, starting with `/`
    pub path: String,
    /// http method
    pub method: Method,
    /// query parameters
    pub query: Vec<(String, String)>,
    model: PhantomData<fn() -> M>,
}

impl<M> Request<M> {
    /// Create a GET request with no parameters
    pub fn get<P: Into<String>>(path: P) -> Self {
        Self {
            path: path.into(),
            method: Method::GET,
            query: Vec::new(),
            model: PhantomData,
        }
    }

    /// Append a query parameter
    pub fn param<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Look up the first value of a query parameter
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<M> fmt::Debug for Request<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("query", &self.query)
            .finish()
    }
}

/// Successful response of a request: the decoded model and pagination info
#[derive(Debug, Clone)]
pub struct Response<M> {
    /// decoded model
    pub model: M,
    /// pagination info from the `Link` header
    pub pagination: Option<Pagination>,
}

/// Pagination info extracted from a `Link` header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// `max_id` of the next (older) page
    pub next: Option<String>,
    /// `min_id` or `since_id` of the previous (newer) page
    pub previous: Option<String>,
}

impl Pagination {
    /// Parse a `Link` header value such as
    /// `<https://host/api/v1/notifications?max_id=7>; rel="next", <...?min_id=9>; rel="prev"`
    pub fn from_link_header(value: &str) -> Option<Self> {
        let mut pagination = Pagination::default();

        for link in value.split(',') {
            let mut parts = link.split(';');
            let target = match parts.next() {
                Some(t) => t.trim().trim_start_matches('<').trim_end_matches('>'),
                None => continue,
            };
            let rel = parts
                .filter_map(|p| p.trim().strip_prefix("rel="))
                .map(|r| r.trim_matches('"'))
                .next();

            let url = match url::Url::parse(target) {
                Ok(u) => u,
                Err(_) => continue,
            };

            let find = |keys: &[&str]| {
                url.query_pairs()
                    .find(|(k, _)| keys.contains(&k.as_ref()))
                    .map(|(_, v)| v.into_owned())
            };

            match rel {
                Some("next") => pagination.next = find(&["max_id"]),
                Some("prev") => pagination.previous = find(&["min_id", "since_id"]),
                _ => {}
            }
        }

        if pagination == Pagination::default() {
            None
        } else {
            Some(pagination)
        }
    }
}

/// Search requests
pub mod search {
    use super::*;

    /// Exact search, `GET /api/v2/search`
    pub fn search(query: &str, limit: u32, resolve: bool) -> Request<SearchResults> {
        Request::get("/api/v2/search")
            .param("q", query)
            .param("limit", limit)
            .param("resolve", resolve)
    }

    /// Relaxed search through the older endpoint, `GET /api/v1/search`.
    /// Used when an instance does not know the v2 endpoint.
    pub fn fallback_search(query: &str, resolve: bool) -> Request<SearchResults> {
        Request::get("/api/v1/search")
            .param("q", query)
            .param("resolve", resolve)
    }
}

/// Account requests
pub mod accounts {
    use super::*;

    /// Search accounts, `GET /api/v1/accounts/search`
    pub fn search(query: &str, limit: u32) -> Request<Vec<Account>> {
        Request::get("/api/v1/accounts/search")
            .param("q", query)
            .param("limit", limit)
    }
}
