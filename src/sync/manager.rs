use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{self, Stream};
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{debug, error, info, warn};

use crate::app::{Result, SnooError};
use crate::config::Config;
use crate::domain::{PendingState, Subreddit, Subscription};
use crate::remote::RemoteService;
use crate::store::{ConflictPolicy, PrefsStore, SubscriptionQuery, SubscriptionStore};
use crate::sync::ordering::pin_reserved;
use crate::sync::reconcile::merge_remote_with_local;

pub const DEFAULT_SUBREDDIT_PREF: &str = "default_subreddit";

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub frontpage: String,
    pub popular: String,
    pub logged_out_defaults: Vec<String>,
    pub replay_workers: usize,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            frontpage: config.subreddits.frontpage.clone(),
            popular: config.subreddits.popular.clone(),
            logged_out_defaults: config.subreddits.logged_out_defaults.clone(),
            replay_workers: config.sync.replay_workers.max(1),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Outcome of replaying every pending subscribe/unsubscribe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Remote confirmed the change.
    pub replayed: Vec<String>,
    /// Replayed, but the remote call failed again and the row stays queued.
    pub still_pending: Vec<String>,
    /// Replay did not go through, with the reason. Rows for subreddits that
    /// no longer exist are dropped and land here too.
    pub failed: Vec<(String, String)>,
}

enum Replayed {
    Confirmed,
    Queued,
    Dropped(String),
}

impl ReplayReport {
    pub fn is_clean(&self) -> bool {
        self.still_pending.is_empty() && self.failed.is_empty()
    }
}

/// Keeps the local subscription table in step with Reddit.
///
/// Reads are served from the store. Mutations go to Reddit first and fall
/// back to a pending row when the remote call fails, so nothing the user did
/// offline is lost.
pub struct SubscriptionManager<S> {
    store: Arc<S>,
    remote: Arc<dyn RemoteService + Send + Sync>,
    settings: Arc<SyncSettings>,
}

impl<S> Clone for SubscriptionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            remote: self.remote.clone(),
            settings: self.settings.clone(),
        }
    }
}

struct Watch<S> {
    manager: SubscriptionManager<S>,
    changes: watch::Receiver<u64>,
    query: SubscriptionQuery,
    started: bool,
    refreshing: Arc<AtomicBool>,
    refreshed_tx: mpsc::UnboundedSender<Result<()>>,
    refreshed: mpsc::UnboundedReceiver<Result<()>>,
}

impl<S> Watch<S>
where
    S: SubscriptionStore + PrefsStore + Send + Sync + 'static,
{
    /// `None` means the table is empty and a refresh is (now) in flight.
    fn listing(&self) -> Result<Option<Vec<Subscription>>> {
        let store = &self.manager.store;
        let filtered = store.query(&self.query)?;

        if filtered.is_empty() && store.query(&SubscriptionQuery::all())?.is_empty() {
            self.spawn_refresh();
            return Ok(None);
        }

        let settings = &self.manager.settings;
        Ok(Some(pin_reserved(
            filtered,
            &settings.frontpage,
            &settings.popular,
        )))
    }

    fn spawn_refresh(&self) {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            return;
        }

        debug!("No local subscriptions, refreshing from remote");
        let manager = self.manager.clone();
        let refreshing = self.refreshing.clone();
        let refreshed = self.refreshed_tx.clone();
        tokio::spawn(async move {
            let result = manager.refresh_subscriptions().await;
            if let Err(ref e) = result {
                error!("Background subscription refresh failed: {}", e);
            }
            refreshing.store(false, Ordering::SeqCst);
            // The stream may already be gone.
            let _ = refreshed.send(result);
        });
    }
}

impl<S> SubscriptionManager<S>
where
    S: SubscriptionStore + PrefsStore + Send + Sync + 'static,
{
    pub fn new(
        store: Arc<S>,
        remote: Arc<dyn RemoteService + Send + Sync>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            settings: Arc::new(settings),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    pub fn is_frontpage(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.settings.frontpage)
    }

    /// Live, pinned listing of subscriptions whose name contains `filter_term`.
    ///
    /// Emits once immediately and again after every store write. When the
    /// whole table is empty a background refresh is started instead: its
    /// write wakes the stream, its error is emitted as an `Err` item, and a
    /// refresh that finds nothing emits an empty listing. Dropping the
    /// stream does not cancel that refresh.
    pub fn get_all(
        &self,
        filter_term: &str,
        include_hidden: bool,
    ) -> impl Stream<Item = Result<Vec<Subscription>>> + Send + 'static {
        let (refreshed_tx, refreshed) = mpsc::unbounded_channel();
        let state = Watch {
            manager: self.clone(),
            changes: self.store.changes(),
            query: SubscriptionQuery::search(filter_term, include_hidden),
            started: false,
            refreshing: Arc::new(AtomicBool::new(false)),
            refreshed_tx,
            refreshed,
        };

        stream::unfold(state, |mut state| async move {
            loop {
                if state.started {
                    let refreshed = tokio::select! {
                        changed = state.changes.changed() => match changed {
                            Ok(()) => None,
                            Err(_) => return None,
                        },
                        Some(result) = state.refreshed.recv() => Some(result),
                    };

                    match refreshed {
                        None => {}
                        Some(Err(e)) => return Some((Err(e), state)),
                        // A refresh that wrote rows also bumps the version and
                        // is emitted from there. One that left the table empty
                        // never will, so report the empty listing here.
                        Some(Ok(())) => {
                            match state.manager.store.query(&SubscriptionQuery::all()) {
                                Ok(rows) if rows.is_empty() => {
                                    return Some((Ok(Vec::new()), state))
                                }
                                Ok(_) => continue,
                                Err(e) => return Some((Err(e), state)),
                            }
                        }
                    }
                }
                state.started = true;
                state.changes.borrow_and_update();

                match state.listing() {
                    Ok(Some(subs)) => return Some((Ok(subs), state)),
                    Ok(None) => continue,
                    Err(e) => return Some((Err(e), state)),
                }
            }
        })
    }

    pub fn get_all_including_hidden(
        &self,
    ) -> impl Stream<Item = Result<Vec<Subscription>>> + Send + 'static {
        self.get_all("", true)
    }

    /// Fetch the remote listing, merge it with local pending state and
    /// replace the table in one transaction.
    pub async fn refresh_subscriptions(&self) -> Result<()> {
        let local = self.store.query(&SubscriptionQuery::all())?;
        let remote_names = self.fetch_remote_names().await?;

        let merged = merge_remote_with_local(&local, &remote_names);
        self.store.replace_all(&merged)?;

        info!(
            "Synced {} subscriptions ({} remote)",
            merged.len(),
            remote_names.len()
        );
        Ok(())
    }

    async fn fetch_remote_names(&self) -> Result<Vec<String>> {
        if !self.remote.is_user_logged_in().await? {
            return Ok(self.settings.logged_out_defaults.clone());
        }

        let mut names: Vec<String> = self
            .remote
            .user_subreddits()
            .await?
            .into_iter()
            .map(|s| s.display_name)
            .collect();

        names.insert(0, self.settings.frontpage.clone());
        if !names
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&self.settings.popular))
        {
            names.insert(1, self.settings.popular.clone());
        }

        Ok(names)
    }

    /// Subscribe on Reddit. A failed remote call is queued as a pending
    /// subscribe instead of being returned.
    pub async fn subscribe(&self, subreddit: &Subreddit) -> Result<()> {
        let name = &subreddit.display_name;

        let pending_state = match self.remote.subscribe_to(subreddit).await {
            Ok(()) => PendingState::None,
            Err(e) => {
                warn!("Subscribing to r/{} failed, will retry: {}", name, e);
                PendingState::PendingSubscribe
            }
        };

        self.store.insert(
            &Subscription::new(name.clone(), pending_state, false),
            ConflictPolicy::Replace,
        )?;
        Ok(())
    }

    /// Remove locally right away, then on Reddit. Remote failures other than
    /// not-found put the row back as a pending unsubscribe.
    pub async fn unsubscribe(&self, subscription: &Subscription) -> Result<()> {
        let name = &subscription.name;
        self.store.delete(name)?;

        let result = match self.remote.find_subreddit(name).await {
            Ok(subreddit) => self.remote.unsubscribe_from(&subreddit).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => debug!("Unsubscribed from r/{}", name),
            Err(e) if e.is_not_found() => debug!("r/{} is already gone on remote", name),
            Err(e) => {
                warn!("Unsubscribing from r/{} failed, will retry: {}", name, e);
                let queued = subscription.with_pending_state(PendingState::PendingUnsubscribe);
                if let Err(e) = self.store.insert(&queued, ConflictPolicy::Abort) {
                    warn!("Could not queue unsubscribe for r/{}: {}", name, e);
                }
            }
        }

        Ok(())
    }

    pub fn set_hidden(&self, subscription: &Subscription, hidden: bool) -> Result<()> {
        match subscription.pending_state {
            PendingState::PendingUnsubscribe => Err(SnooError::InvalidState(format!(
                "r/{} is marked for removal, its visibility cannot change",
                subscription.name
            ))),
            PendingState::None | PendingState::PendingSubscribe => {
                let updated =
                    Subscription::new(subscription.name.clone(), subscription.pending_state, hidden);
                self.store.update(&updated)?;
                Ok(())
            }
        }
    }

    pub fn remove_all(&self) -> Result<()> {
        let removed = self.store.delete_all()?;
        info!("Removed {} subscriptions", removed);
        Ok(())
    }

    /// Retry every queued subscribe/unsubscribe. Each row is replayed
    /// independently; one failing never stops the others.
    pub async fn execute_pending_subscribes_and_unsubscribes(&self) -> Result<ReplayReport> {
        let pending = self.store.query(&SubscriptionQuery::pending())?;
        let mut report = ReplayReport::default();

        if pending.is_empty() {
            return Ok(report);
        }
        debug!("Executing {} pending subscription changes", pending.len());

        let semaphore = Semaphore::new(self.settings.replay_workers);
        let replays = pending.into_iter().map(|sub| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.ok();
                let result = self.replay(&sub).await;
                (sub.name, result)
            }
        });

        for (name, result) in join_all(replays).await {
            match result {
                Ok(Replayed::Confirmed) => report.replayed.push(name),
                Ok(Replayed::Queued) => report.still_pending.push(name),
                Ok(Replayed::Dropped(reason)) => report.failed.push((name, reason)),
                Err(e) => {
                    warn!("Replaying pending change for r/{} failed: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Pending changes: {} replayed, {} still pending, {} failed",
            report.replayed.len(),
            report.still_pending.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn replay(&self, pending: &Subscription) -> Result<Replayed> {
        match pending.pending_state {
            PendingState::PendingSubscribe => {
                info!("Subscribing to r/{}", pending.name);
                let subreddit = match self.remote.find_subreddit(&pending.name).await {
                    Ok(subreddit) => subreddit,
                    Err(e) if e.is_not_found() => {
                        warn!("r/{} no longer exists, dropping pending subscribe", pending.name);
                        self.store.delete(&pending.name)?;
                        return Ok(Replayed::Dropped(format!(
                            "r/{} no longer exists, pending subscribe dropped",
                            pending.name
                        )));
                    }
                    Err(e) => return Err(e),
                };

                // Reddit may report a differently cased name; keep one row.
                if subreddit.display_name != pending.name {
                    self.store.delete(&pending.name)?;
                }
                self.subscribe(&subreddit).await?;
                self.outcome(&subreddit.display_name)
            }
            PendingState::PendingUnsubscribe => {
                info!("Unsubscribing from r/{}", pending.name);
                self.unsubscribe(pending).await?;
                self.outcome(&pending.name)
            }
            PendingState::None => Ok(Replayed::Confirmed),
        }
    }

    fn outcome(&self, name: &str) -> Result<Replayed> {
        Ok(match self.store.get(name)? {
            Some(sub) if sub.pending_state.is_pending() => Replayed::Queued,
            _ => Replayed::Confirmed,
        })
    }

    pub fn default_subreddit(&self) -> Result<String> {
        Ok(self
            .store
            .get_pref(DEFAULT_SUBREDDIT_PREF)?
            .unwrap_or_else(|| self.settings.frontpage.clone()))
    }

    pub fn set_as_default(&self, subscription: &Subscription) -> Result<()> {
        self.store
            .set_pref(DEFAULT_SUBREDDIT_PREF, &subscription.name)
    }

    pub fn reset_default_subreddit(&self) -> Result<()> {
        self.store
            .set_pref(DEFAULT_SUBREDDIT_PREF, &self.settings.frontpage)
    }

    pub fn is_default(&self, subscription: &Subscription) -> Result<bool> {
        Ok(subscription.is_named(&self.default_subreddit()?))
    }
}
