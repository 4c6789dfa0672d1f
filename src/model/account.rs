use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Emoji};

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// account id
    pub id: String,
    /// username of the account
    pub username: String,
    /// equals username for local users, includes @domain for remote ones
    pub acct: String,
    /// profile page url, can be remote
    #[serde(default)]
    pub url: Option<String>,
    /// display name
    #[serde(default)]
    pub display_name: String,
    /// biography, in html
    #[serde(default)]
    pub note: String,
    /// avatar image url
    #[serde(default)]
    pub avatar: Option<String>,
    /// static avatar image url
    #[serde(default)]
    pub avatar_static: Option<String>,
    /// header image url
    #[serde(default)]
    pub header: Option<String>,
    /// static header image url
    #[serde(default)]
    pub header_static: Option<String>,
    /// follow requests need manual approval
    #[serde(default)]
    pub locked: bool,
    /// creation time
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// followers count
    #[serde(default)]
    pub followers_count: u64,
    /// following count
    #[serde(default)]
    pub following_count: u64,
    /// statuses count
    #[serde(default)]
    pub statuses_count: u64,
    /// account is a bot
    #[serde(default)]
    pub bot: Option<bool>,
    /// the account this user has moved to
    #[serde(default)]
    pub moved: Option<Box<Account>>,
    /// profile metadata fields
    #[serde(default)]
    pub fields: Vec<Field>,
    /// custom emojis used in names and note
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

/// A profile metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// field key
    pub name: String,
    /// field value, in html
    pub value: String,
    /// when the link in value was verified
    #[serde(default, with = "timestamp::option")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Fediverse-wide `user@domain` handle of this account, using `local_domain`
    /// for accounts that live on the instance the client is connected to.
    pub fn canonical_uri(&self, local_domain: &str) -> String {
        if self.acct.contains('@') {
            self.acct.clone()
        } else {
            format!("{}@{}", self.acct, local_domain)
        }
    }

    /// Domain the account lives on, `None` for accounts local to the instance.
    pub fn domain(&self) -> Option<&str> {
        self.acct.split_once('@').map(|(_, domain)| domain)
    }
}
