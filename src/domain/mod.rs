pub mod subreddit;
pub mod subscription;

pub use subreddit::Subreddit;
pub use subscription::{PendingState, Subscription};
