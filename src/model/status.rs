use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Account, Emoji};

/// A posted status (toot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// status id
    pub id: String,
    /// fediverse-unique resource id
    pub uri: String,
    /// status page url, can be remote
    #[serde(default)]
    pub url: Option<String>,
    /// the author
    pub account: Account,
    /// id of the status it replies to
    #[serde(default)]
    pub in_reply_to_id: Option<String>,
    /// id of the account it replies to
    #[serde(default)]
    pub in_reply_to_account_id: Option<String>,
    /// the reblogged status
    #[serde(default)]
    pub reblog: Option<Box<Status>>,
    /// body, in sanitized html
    pub content: String,
    /// creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// last edit time
    #[serde(default, with = "timestamp::option")]
    pub edited_at: Option<DateTime<Utc>>,
    /// custom emojis used in content
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    /// replies count
    #[serde(default)]
    pub replies_count: u64,
    /// reblogs count
    #[serde(default)]
    pub reblogs_count: u64,
    /// favourites count
    #[serde(default)]
    pub favourites_count: u64,
    /// current user reblogged it
    #[serde(default)]
    pub reblogged: Option<bool>,
    /// current user favourited it
    #[serde(default)]
    pub favourited: Option<bool>,
    /// current user bookmarked it
    #[serde(default)]
    pub bookmarked: Option<bool>,
    /// pinned on the author profile
    #[serde(default)]
    pub pinned: Option<bool>,
    /// media should be hidden by default
    #[serde(default)]
    pub sensitive: bool,
    /// content warning
    #[serde(default)]
    pub spoiler_text: String,
    /// visibility
    pub visibility: Visibility,
    /// media attachments
    #[serde(default)]
    pub media_attachments: Vec<Attachment>,
    /// mentioned accounts
    #[serde(default)]
    pub mentions: Vec<Mention>,
    /// used hashtags
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// detected language
    #[serde(default)]
    pub language: Option<String>,
}

/// Status visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// visible everywhere
    Public,
    /// visible on profile and to followers, not on public timelines
    Unlisted,
    /// followers only
    Private,
    /// mentioned users only
    Direct,
}

/// Media attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// attachment id
    pub id: String,
    /// `image`, `video`, `gifv`, `audio` or `unknown`
    pub r#type: String,
    /// media url
    #[serde(default)]
    pub url: Option<String>,
    /// preview url
    #[serde(default)]
    pub preview_url: Option<String>,
    /// remote url when the media lives on another server
    #[serde(default)]
    pub remote_url: Option<String>,
    /// alt text
    #[serde(default)]
    pub description: Option<String>,
}

/// Mention of an account in a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// account id
    pub id: String,
    /// username
    pub username: String,
    /// webfinger handle
    pub acct: String,
    /// profile url
    pub url: String,
}

/// Hashtag used in a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// tag name without the leading `#`
    pub name: String,
    /// tag timeline url
    pub url: String,
}

impl Status {
    /// The status whose content should be shown: the reblogged one for reblogs.
    pub fn original(&self) -> &Status {
        self.reblog.as_deref().unwrap_or(self)
    }
}
