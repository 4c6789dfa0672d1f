//! Logical streams a listener can subscribe to.

use std::fmt::Display;

use snafu::prelude::*;
use url::Url;

/// Path of the streaming endpoint, relative to the instance base url
pub const STREAMING_PATH: &str = "/api/v1/streaming";

/// One logical stream of the streaming api.
///
/// A connection serves exactly one subscription, switching stream means a new connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamSubscription {
    /// home timeline and notifications of the current user
    User,
    /// federated timeline
    Public,
    /// local timeline
    PublicLocal,
    /// federated statuses with a hashtag
    Hashtag(String),
    /// local statuses with a hashtag
    HashtagLocal(String),
    /// statuses of a list, by list id
    List(String),
    /// direct conversations
    Direct,
}

impl StreamSubscription {
    /// Canonical stream name, used as the `stream` query parameter
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Public => "public",
            Self::PublicLocal => "public:local",
            Self::Hashtag(_) => "hashtag",
            Self::HashtagLocal(_) => "hashtag:local",
            Self::List(_) => "list",
            Self::Direct => "direct",
        }
    }

    /// Query parameters selecting this stream, authorized by `access_token`
    pub fn make_query_items(&self, access_token: &str) -> Vec<(&'static str, String)> {
        let mut items = vec![
            ("access_token", access_token.to_string()),
            ("stream", self.name().to_string()),
        ];

        match self {
            Self::Hashtag(tag) | Self::HashtagLocal(tag) => items.push(("tag", tag.clone())),
            Self::List(list) => items.push(("list", list.clone())),
            Self::User | Self::Public | Self::PublicLocal | Self::Direct => {}
        }

        items
    }
}

impl Display for StreamSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashtag(tag) | Self::HashtagLocal(tag) => write!(f, "{}#{}", self.name(), tag),
            Self::List(list) => write!(f, "{}/{}", self.name(), list),
            _ => f.write_str(self.name()),
        }
    }
}

/// Base url can not host a streaming endpoint
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum InvalidBaseUrl {
    /// the url scheme is not http(s) or ws(s)
    #[snafu(display("the url {url} has invalid scheme {scheme}, only http(s) or ws(s) is ok"))]
    InvalidScheme {
        /// the url
        url: String,
        /// invalid scheme
        scheme: String,
    },

    /// the url can not have path segments
    #[snafu(display("the url {url} can not be a base url"))]
    CannotBeABase {
        /// the url
        url: String,
    },
}

/// The websocket endpoint of an instance, e.g. `wss://example.social/api/v1/streaming`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingEndpoint {
    url: Url,
}

impl StreamingEndpoint {
    /// Derive the endpoint from an instance base url, mapping http(s) to ws(s)
    pub fn new(base_url: &Url) -> Result<Self, InvalidBaseUrl> {
        Self::with_path(base_url, STREAMING_PATH)
    }

    /// Derive the endpoint from an instance base url and a custom streaming path
    pub fn with_path(base_url: &Url, path: &str) -> Result<Self, InvalidBaseUrl> {
        let scheme = match base_url.scheme() {
            "https" | "wss" => "wss",
            "http" | "ws" => "ws",
            other => {
                return error::InvalidScheme {
                    url: base_url.as_str(),
                    scheme: other,
                }
                .fail()
            }
        };

        let mut url = base_url.clone();
        url.set_query(None);
        url.set_fragment(None);

        url.path_segments_mut()
            .map_err(|_| {
                error::CannotBeABase {
                    url: base_url.as_str(),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));

        // http <-> ws are both special schemes, so this can not fail
        let _ = url.set_scheme(scheme);

        Ok(Self { url })
    }

    /// Build the final connection url for a subscription
    pub fn url(&self, access_token: &str, subscription: &StreamSubscription) -> Url {
        let mut url = self.url.clone();

        {
            let mut query = url.query_pairs_mut();
            for (k, v) in subscription.make_query_items(access_token) {
                query.append_pair(k, &v);
            }
        }

        url
    }
}

impl Display for StreamingEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.url.fmt(f)
    }
}
