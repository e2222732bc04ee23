use serde::{Deserialize, Serialize};

/// Remote handle for a subreddit, as resolved through the Reddit API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subreddit {
    pub display_name: String,
    /// Reddit thing id (`t5_...`), when the handle came from the API.
    pub fullname: Option<String>,
}

impl Subreddit {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            fullname: None,
        }
    }

    pub fn with_fullname(display_name: impl Into<String>, fullname: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            fullname: Some(fullname.into()),
        }
    }
}
