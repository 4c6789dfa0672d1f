use reqwest::header::{HeaderMap, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use url::Url;

use super::error::variant::*;
use super::types::{Pagination, Request, Response};
use super::Result;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Executes declarative [`Request`]s against an instance.
#[async_trait::async_trait]
pub trait Client: Send + Sync + 'static {
    /// Run the request, decoding the response body as `M`
    async fn run<M>(&self, request: Request<M>) -> Result<Response<M>>
    where
        M: DeserializeOwned + Send + 'static;
}

/// Mastodon HTTP API Client
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new api client for the instance at `base_url`, authorized by an oauth2 access token
    pub fn new<S: AsRef<str> + ?Sized>(base_url: Url, access_token: &S) -> Result<Self> {
        let auth_header_value = format!("Bearer {}", access_token.as_ref())
            .parse()
            .map_err(|_| TokenInvalid.build())?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_header_value);

        let client = reqwest::Client::builder()
            .gzip(true)
            .deflate(true)
            .user_agent(APP_USER_AGENT)
            .default_headers(headers)
            .build()
            .context(ClientCreateFailed)?;

        Ok(Self { base_url, client })
    }

    /// The instance base url
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append the request path to the base url, keeping any path prefix the base url has
    fn request_url(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                InvalidPath {
                    base_url: self.base_url.as_str(),
                    path,
                }
                .build()
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl Client for HttpClient {
    async fn run<M>(&self, request: Request<M>) -> Result<Response<M>>
    where
        M: DeserializeOwned + Send + 'static,
    {
        let url = self.request_url(&request.path)?;

        let req = self
            .client
            .request(request.method.clone(), url.clone())
            .query(&request.query)
            .build()
            .context(BuildRequestFailed)?;

        log::debug!("{} {}", req.method(), req.url());

        let resp = self
            .client
            .execute(req)
            .await
            .with_context(|_| RequestFailed {
                method: request.method.clone(),
                url: url.as_str(),
            })?;

        ensure!(
            resp.status().is_success(),
            HTTPStatusNotOK {
                method: request.method.clone(),
                url: url.as_str(),
                status_code: resp.status()
            }
        );

        let pagination = resp
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(Pagination::from_link_header);

        let body = resp.bytes().await.with_context(|_| RequestFailed {
            method: request.method.clone(),
            url: url.as_str(),
        })?;

        let model: M = serde_json::from_slice(&body).with_context(|_| ParseBodyFailed { body })?;

        Ok(Response { model, pagination })
    }
}
