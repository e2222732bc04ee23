pub mod manager;
pub mod ordering;
pub mod reconcile;

pub use manager::{ReplayReport, SubscriptionManager, SyncSettings};
pub use ordering::pin_reserved;
pub use reconcile::merge_remote_with_local;
