use snafu::prelude::*;

/// API Error
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(variant), context(suffix(false)))]
pub enum Error {
    /// access token is invalid(contains invalid character that cant be send in HTTP header)
    #[snafu(display("access token is invalid"))]
    TokenInvalid,

    /// create HTTP client failed
    #[snafu(display("create api client failed: {source}"))]
    ClientCreateFailed {
        /// source error
        source: reqwest::Error,
    },

    /// base url can not take a request path (e.g. `mailto:` or `data:` urls)
    #[snafu(display("base url {base_url} can not take request path {path}"))]
    InvalidPath {
        /// instance base url
        base_url: String,
        /// request path
        path: String,
    },

    /// build api request failed
    #[snafu(display("build request failed: {source}"))]
    BuildRequestFailed {
        /// source error
        source: reqwest::Error,
    },

    /// send api request failed
    #[snafu(display("{} url {url} failed: {source}", method.as_str()))]
    RequestFailed {
        /// http method
        method: reqwest::Method,
        /// target url
        url: String,
        /// source http error
        source: reqwest::Error,
    },

    /// http response of api request is not successful
    #[snafu(display("{} url {url} got http status code {status_code}", method.as_str()))]
    HTTPStatusNotOK {
        /// http method
        method: reqwest::Method,
        /// request url
        url: String,
        /// received http status code
        status_code: reqwest::StatusCode,
    },

    /// parse response body of api request as target json type failed
    #[snafu(display("parse response body {body:?} failed: {source}"))]
    ParseBodyFailed {
        /// http response body
        body: bytes::Bytes,
        /// source parse error
        source: serde_json::Error,
    },
}

impl Error {
    /// The http status code when the server answered with a non-success status
    pub fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::HTTPStatusNotOK { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Server answered 404 Not Found
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(reqwest::StatusCode::NOT_FOUND)
    }
}
