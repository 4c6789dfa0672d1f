//! crate error types

use snafu::prelude::*;

use super::api::Error as APIError;
use super::ws::InvalidBaseUrl;

/// crate result type
pub type Result<T> = std::result::Result<T, Error>;

/// crate error type
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum Error {
    /// Create the mastodon api client failed
    #[snafu(display("create mastodon api client failed: {source}"))]
    CreateAPIClientFailed {
        /// source error
        source: APIError,
    },

    /// The instance url can not be used
    #[snafu(display("invalid instance url {url}"))]
    InvalidInstanceURL {
        /// received url
        url: String,
        /// source error
        source: url::ParseError,
    },

    /// The instance url can not host a streaming endpoint
    #[snafu(display("create streaming listener failed: {source}"))]
    CreateListenerFailed {
        /// source error
        source: InvalidBaseUrl,
    },
}
