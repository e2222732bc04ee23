use serde::{Deserialize, Serialize};

/// Connection settings for the Reddit API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// OAuth bearer token. Without one the client is logged out and only
    /// reads public listings.
    pub access_token: Option<String>,

    pub user_agent: String,

    /// Host for authenticated requests (default: https://oauth.reddit.com)
    pub oauth_url: String,

    /// Host for logged-out reads (default: https://www.reddit.com)
    pub public_url: String,

    /// Request timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            user_agent: concat!("snoosync/", env!("CARGO_PKG_VERSION")).to_string(),
            oauth_url: "https://oauth.reddit.com".to_string(),
            public_url: "https://www.reddit.com".to_string(),
            timeout_secs: 10,
        }
    }
}
