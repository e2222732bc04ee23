use serde::{Deserialize, Serialize};

/// Names of the pinned pseudo-subreddits and the logged-out listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubredditConfig {
    pub frontpage: String,
    pub popular: String,
    /// Shown when no account is logged in.
    pub logged_out_defaults: Vec<String>,
}

impl Default for SubredditConfig {
    fn default() -> Self {
        Self {
            frontpage: "Frontpage".to_string(),
            popular: "Popular".to_string(),
            logged_out_defaults: [
                "Frontpage",
                "Popular",
                "AskReddit",
                "worldnews",
                "todayilearned",
                "pics",
                "aww",
                "gifs",
                "videos",
                "science",
                "movies",
                "Showerthoughts",
                "EarthPorn",
                "mildlyinteresting",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pending mutations replayed at once (default: 4)
    pub replay_workers: usize,

    /// Daemon cycle, e.g. "15m", "1h" (default: "30m")
    pub daemon_interval: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            replay_workers: 4,
            daemon_interval: "30m".to_string(),
        }
    }
}
