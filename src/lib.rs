//! # snoosync
//!
//! An offline-first cache of a Reddit account's subreddit subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! RemoteService ─┐
//!                ├→ reconcile → Store → change stream → readers
//! Store (local) ─┘
//! ```
//!
//! Reads are always served from the local store. Subscribes and
//! unsubscribes are sent to Reddit and, when that fails, kept as pending
//! rows that a later sync replays. A refresh merges the remote listing with
//! local pending state, so an unconfirmed change is never lost to a refresh.
//!
//! ## Quick Start
//!
//! ```bash
//! export SNOOSYNC_ACCESS_TOKEN=...   # optional, logged out without it
//!
//! snoosync list
//! snoosync subscribe rust
//! snoosync hide pics
//! snoosync sync                      # retry pending changes
//! snoosync daemon --interval 30m
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Application context and error types
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: TOML configuration
//! - [`daemon`]: Periodic replay and refresh
//! - [`domain`]: Subscription and Subreddit models
//! - [`remote`]: Reddit API client
//! - [`store`]: SQLite persistence with change notification
//! - [`sync`]: Reconciliation, ordering and the subscription manager

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store,
/// remote client and manager.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/snoosync/config.toml`.
pub mod config;

/// Foreground loop that replays pending changes and refreshes on an interval.
pub mod daemon;

/// Core domain models.
///
/// - [`Subscription`](domain::Subscription): a locally tracked subreddit
/// - [`PendingState`](domain::PendingState): unconfirmed subscribe/unsubscribe
/// - [`Subreddit`](domain::Subreddit): remote handle
pub mod domain;

/// Reddit as the remote source of truth.
///
/// - [`RemoteService`](remote::RemoteService): async trait consumed by the manager
/// - [`RedditClient`](remote::RedditClient): reqwest-based implementation
pub mod remote;

/// SQLite persistence layer.
///
/// - [`SubscriptionStore`](store::SubscriptionStore): table operations and change notification
/// - [`PrefsStore`](store::PrefsStore): key/value preferences
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation of both
pub mod store;

/// Keeping the local table consistent with Reddit.
///
/// - [`merge_remote_with_local`](sync::merge_remote_with_local): pure three-way merge
/// - [`pin_reserved`](sync::pin_reserved): frontpage/popular ordering
/// - [`SubscriptionManager`](sync::SubscriptionManager): reads, mutations and replay
pub mod sync;
