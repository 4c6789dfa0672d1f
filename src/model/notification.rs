use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{timestamp, Account, Status};

/// A notification for the current user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// notification id
    pub id: String,
    /// what happened
    pub r#type: NotificationType,
    /// creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// the account that caused the notification
    pub account: Account,
    /// the status involved, if any
    #[serde(default)]
    pub status: Option<Status>,
}

/// Notification kind, unknown kinds are kept by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    /// the user has been mentioned
    Mention,
    /// a status was reblogged
    Reblog,
    /// a status was favourited
    Favourite,
    /// a status was bookmarked
    Bookmark,
    /// new follower
    Follow,
    /// new follow request
    FollowRequest,
    /// a poll has ended
    Poll,
    /// a followed account posted
    Status,
    /// a status the user interacted with was edited
    Update,
    /// any other kind
    Other(String),
}

impl NotificationType {
    /// wire name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mention => "mention",
            Self::Reblog => "reblog",
            Self::Favourite => "favourite",
            Self::Bookmark => "bookmark",
            Self::Follow => "follow",
            Self::FollowRequest => "follow_request",
            Self::Poll => "poll",
            Self::Status => "status",
            Self::Update => "update",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for NotificationType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "mention" => Self::Mention,
            "reblog" => Self::Reblog,
            "favourite" => Self::Favourite,
            "bookmark" => Self::Bookmark,
            "follow" => Self::Follow,
            "follow_request" => Self::FollowRequest,
            "poll" => Self::Poll,
            "status" => Self::Status,
            "update" => Self::Update,
            _ => Self::Other(name),
        }
    }
}

impl Serialize for NotificationType {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(Self::from)
    }
}
