//! # tootstream
//!
//! Real-time event ingestion for Mastodon clients.
//!
//! - [`ws::Listener`] keeps one streaming websocket alive: it watches the connection
//!   for silence, reconnects with exponential backoff and decodes frames into
//!   [`ws::ClientEvent`]s handed to a [`ws::ListenerDelegate`].
//! - [`resolver::Resolver`] finds local copies of remote statuses and accounts
//!   through the instance search api.
//! - [`Instance`] builds both from an instance url and an access token.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_debug_implementations, missing_docs)]
#![forbid(unsafe_code)]

pub mod api;
pub mod model;
pub mod resolver;
pub mod ws;

mod error;
pub use error::{Error, Result};

use snafu::prelude::*;
use url::Url;

/// Connection parameters of one Mastodon instance
#[derive(Clone)]
pub struct Instance {
    base_url: Url,
    access_token: String,
    api_client: api::HttpClient,
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Instance {
    /// Create from the instance url (e.g. `https://example.social`) and an oauth2 access token
    pub fn new<S: Into<String>>(base_url: &str, access_token: S) -> Result<Self> {
        let base_url = Url::parse(base_url).with_context(|_| error::InvalidInstanceURL {
            url: base_url,
        })?;
        let access_token = access_token.into();

        let api_client = api::HttpClient::new(base_url.clone(), &access_token)
            .context(error::CreateAPIClientFailed)?;

        log::info!("Create api client of {} success", base_url);

        Ok(Self {
            base_url,
            access_token,
            api_client,
        })
    }

    /// The instance base url
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Domain of the instance, used to build canonical account uris
    pub fn domain(&self) -> Option<&str> {
        self.base_url.domain()
    }

    /// The REST api client
    pub fn api_client(&self) -> &api::HttpClient {
        &self.api_client
    }

    /// Create a streaming listener of this instance, see [`ws::Listener::new`]
    pub fn listener(&self) -> Result<ws::Listener> {
        self.listener_with_config(ws::ListenerConfig::default())
    }

    /// Create a streaming listener with custom config
    pub fn listener_with_config(&self, config: ws::ListenerConfig) -> Result<ws::Listener> {
        ws::Listener::with_connector(
            &self.base_url,
            self.access_token.as_str(),
            config,
            ws::TungsteniteConnector,
        )
        .context(error::CreateListenerFailed)
    }

    /// Create a resolver using the REST api client of this instance
    pub fn resolver(&self) -> resolver::Resolver<api::HttpClient> {
        resolver::Resolver::new(self.api_client.clone())
    }
}
