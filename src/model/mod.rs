//! Mastodon entities carried by streaming events and search results.

mod account;
mod notification;
mod status;
pub mod timestamp;

pub use account::{Account, Field};
pub use notification::{Notification, NotificationType};
pub use status::{Attachment, Mention, Status, Tag, Visibility};

use serde::{Deserialize, Serialize};

/// Custom emoji
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    /// shortcode without colons
    pub shortcode: String,
    /// image url
    pub url: String,
    /// static image url
    #[serde(default)]
    pub static_url: Option<String>,
}

/// Results of a search request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SearchResults {
    /// matched accounts
    #[serde(default)]
    pub accounts: Vec<Account>,
    /// matched statuses
    #[serde(default)]
    pub statuses: Vec<Status>,
}
