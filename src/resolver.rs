//! Best effort resolution of remote statuses and accounts through the instance search api

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use snafu::prelude::*;
use tokio::task::JoinHandle;

use crate::{
    api::{
        self,
        types::{accounts, search},
    },
    model::{Account, SearchResults, Status},
};

/// Error of a status resolution
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum ResolverError {
    /// neither search found the status, or a search failed
    #[snafu(display("status not found"))]
    NotFound,
}

/// Error of an account resolution
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)), module(account_error), context(suffix(false)))]
pub enum AccountResolveError {
    /// search succeeded but returned no account
    #[snafu(display("no account matches {context}"))]
    NoResults {
        /// the searched account uri
        context: String,
    },

    /// search request failed
    #[snafu(display("account search failed: {description}"))]
    NetworkError {
        /// failure description
        description: String,
    },
}

/// Resolves statuses and accounts of other instances into local copies.
///
/// At most one status search is outstanding: starting a new one aborts the previous
/// search, whose completion is then never called.
pub struct Resolver<C> {
    client: Arc<C>,
    search: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
}

impl<C> std::fmt::Debug for Resolver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("resolving", &self.is_resolving())
            .finish()
    }
}

impl<C> Resolver<C> {
    /// Is a status search outstanding
    pub fn is_resolving(&self) -> bool {
        self.search.as_ref().map_or(false, |h| !h.is_finished())
    }
}

impl<C: api::Client> Resolver<C> {
    /// Create a resolver using an api client
    pub fn new(client: C) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    /// Create a resolver using an api client shared with other users
    pub fn with_shared_client(client: Arc<C>) -> Self {
        Self {
            client,
            search: None,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The api client
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Search the status at `uri`, asking the instance to fetch it if unknown.
    ///
    /// `completion` runs on a spawned task once the search settles, unless another
    /// `resolve_status` call superseded this one.
    pub fn resolve_status<F>(&mut self, uri: &str, completion: F)
    where
        F: FnOnce(Result<Status, ResolverError>) + Send + 'static,
    {
        if let Some(previous) = self.search.take() {
            if !previous.is_finished() {
                log::debug!("Abort superseded status search");
            }
            previous.abort();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let latest = self.generation.clone();
        let client = self.client.clone();
        let uri = uri.to_string();

        self.search = Some(tokio::spawn(async move {
            let result = search_status(client.as_ref(), &uri).await;

            if latest.load(Ordering::SeqCst) != generation {
                log::debug!("Status search of {} superseded, result dropped", uri);
                return;
            }

            completion(result)
        }));
    }

    /// Find the local copy of an account, searching by its canonical uri
    pub async fn resolve_account(
        &self,
        account: &Account,
        instance_domain: &str,
    ) -> Result<Account, AccountResolveError> {
        let uri = account.canonical_uri(instance_domain);

        log::debug!("Resolving account {}", uri);

        let resp = self
            .client
            .run(accounts::search(&uri, 1))
            .await
            .map_err(|err| {
                account_error::Network {
                    description: err.to_string(),
                }
                .build()
            })?;

        resp.model
            .into_iter()
            .next()
            .context(account_error::NoResults { context: uri })
    }
}

impl<C> Drop for Resolver<C> {
    fn drop(&mut self) {
        if let Some(search) = self.search.take() {
            search.abort();
        }
    }
}

async fn search_status<C: api::Client>(client: &C, uri: &str) -> Result<Status, ResolverError> {
    log::debug!("Resolving status {}", uri);

    let results: SearchResults = match client.run(search::search(uri, 1, true)).await {
        Ok(resp) => resp.model,
        Err(err) if err.is_not_found() => {
            log::debug!("Search got 404, retry with fallback search");

            match client.run(search::fallback_search(uri, true)).await {
                Ok(resp) => resp.model,
                Err(err) => {
                    log::debug!("Fallback search failed: {}", err);
                    return error::NotFound.fail();
                }
            }
        }
        Err(err) => {
            log::debug!("Search failed: {}", err);
            return error::NotFound.fail();
        }
    };

    results.statuses.into_iter().next().context(error::NotFound)
}
