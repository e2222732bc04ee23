//! Foreground sync loop.
//!
//! Replays pending subscribes/unsubscribes and refreshes the cache on a
//! fixed interval until interrupted.

use std::time::Duration;

use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use crate::app::{Result, SnooError};
use crate::store::{PrefsStore, SubscriptionStore};
use crate::sync::SubscriptionManager;

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub interval_secs: u64,
    /// Run one cycle before the first tick
    pub sync_on_start: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30 * 60,
            sync_on_start: true,
        }
    }
}

impl DaemonConfig {
    /// Parse interval string like "90s", "30m", "6h", "1d", or bare seconds.
    pub fn parse_interval(s: &str) -> Result<u64> {
        let s = s.trim().to_lowercase();
        let (digits, unit) = match s.char_indices().last() {
            Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c),
            _ => (s.as_str(), 's'),
        };

        let multiplier = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86400,
            _ => return Err(Self::invalid(&s)),
        };

        match digits.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n * multiplier),
            _ => Err(Self::invalid(&s)),
        }
    }

    fn invalid(s: &str) -> SnooError {
        SnooError::Config(format!(
            "Invalid interval: {}. Use format like '30m', '1h', '1d'",
            s
        ))
    }

    pub fn format_interval(secs: u64) -> String {
        [(86400, 'd'), (3600, 'h'), (60, 'm')]
            .iter()
            .find(|(unit, _)| secs >= *unit && secs % unit == 0)
            .map(|(unit, suffix)| format!("{}{}", secs / unit, suffix))
            .unwrap_or_else(|| format!("{}s", secs))
    }
}

pub struct Daemon<S> {
    manager: SubscriptionManager<S>,
    config: DaemonConfig,
}

impl<S> Daemon<S>
where
    S: SubscriptionStore + PrefsStore + Send + Sync + 'static,
{
    pub fn new(manager: SubscriptionManager<S>, config: DaemonConfig) -> Self {
        Self { manager, config }
    }

    /// Run until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        info!(
            "snoosync daemon started (interval: {})",
            DaemonConfig::format_interval(self.config.interval_secs)
        );

        let mut timer = interval(Duration::from_secs(self.config.interval_secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        if !self.config.sync_on_start {
            // Skip the immediate first tick
            timer.tick().await;
        }

        loop {
            tokio::select! {
                _ = timer.tick() => self.run_cycle().await,
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        info!("Daemon shutting down");
        Ok(())
    }

    /// One replay-then-refresh cycle. Failures are logged, never fatal.
    pub async fn run_cycle(&self) {
        let start = Utc::now();

        match self
            .manager
            .execute_pending_subscribes_and_unsubscribes()
            .await
        {
            Ok(report) if !report.is_clean() => info!(
                "{} changes still pending, {} failed",
                report.still_pending.len(),
                report.failed.len()
            ),
            Ok(_) => {}
            Err(e) => error!("Replaying pending changes failed: {}", e),
        }

        if let Err(e) = self.manager.refresh_subscriptions().await {
            error!("Refresh failed: {}", e);
        }

        let elapsed = Utc::now().signed_duration_since(start);
        info!(
            "Sync cycle complete ({:.1}s)",
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }
}
