pub mod reddit;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Subreddit;

pub use reddit::RedditClient;

/// Reddit as the source of truth for which subreddits the user follows.
#[async_trait]
pub trait RemoteService {
    async fn is_user_logged_in(&self) -> Result<bool>;

    async fn user_subreddits(&self) -> Result<Vec<Subreddit>>;

    /// Fails with [`SnooError::NotFound`](crate::app::SnooError::NotFound)
    /// when Reddit has no such subreddit.
    async fn find_subreddit(&self, name: &str) -> Result<Subreddit>;

    async fn subscribe_to(&self, subreddit: &Subreddit) -> Result<()>;

    async fn unsubscribe_from(&self, subreddit: &Subreddit) -> Result<()>;
}
