use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnooError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] rusqlite_migration::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote request failed{}: {message}", status_suffix(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },

    #[error("Subreddit not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SnooError {
    /// HTTP status attached to a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SnooError::Http(e) => e.status().map(|s| s.as_u16()),
            SnooError::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// True when the remote reported the subreddit as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnooError::NotFound(_)) || self.status() == Some(404)
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, SnooError>;
