//! Mastodon REST api plumbing: request descriptions and their execution

mod client;
mod error;
pub mod types;

pub use client::{Client, HttpClient};
pub use error::Error;
pub use types::{Pagination, Request, Response};

/// Result type for api module
pub type Result<T> = std::result::Result<T, Error>;
