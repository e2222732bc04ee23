use futures::StreamExt;

use crate::app::{AppContext, Result, SnooError};
use crate::domain::{PendingState, Subreddit, Subscription};
use crate::store::{SubscriptionQuery, SubscriptionStore};
use crate::sync::ReplayReport;

fn print_listing(ctx: &AppContext, subs: &[Subscription]) -> Result<()> {
    if subs.is_empty() {
        println!("No subscriptions");
        return Ok(());
    }

    let default = ctx.manager.default_subreddit()?;
    for sub in subs {
        let marker = match sub.pending_state {
            PendingState::None => ' ',
            PendingState::PendingSubscribe => '+',
            PendingState::PendingUnsubscribe => '-',
        };
        let default_marker = if sub.is_named(&default) { "*" } else { " " };
        let hidden = if sub.hidden { " (hidden)" } else { "" };
        println!("{}{} {}{}", marker, default_marker, sub.name, hidden);
    }

    Ok(())
}

/// Case-insensitive lookup of a cached subscription.
fn find_local(ctx: &AppContext, name: &str) -> Result<Subscription> {
    ctx.store
        .query(&SubscriptionQuery::search(name, true))?
        .into_iter()
        .find(|s| s.is_named(name))
        .ok_or_else(|| SnooError::Other(format!("Not subscribed to r/{}", name)))
}

pub async fn list(ctx: &AppContext, filter: &str, include_hidden: bool) -> Result<()> {
    let mut listing = Box::pin(ctx.manager.get_all(filter, include_hidden));

    match listing.next().await {
        Some(subs) => print_listing(ctx, &subs?),
        None => Ok(()),
    }
}

pub async fn watch(ctx: &AppContext, filter: &str, include_hidden: bool) -> Result<()> {
    let mut listing = Box::pin(ctx.manager.get_all(filter, include_hidden));

    loop {
        tokio::select! {
            next = listing.next() => match next {
                Some(subs) => {
                    println!("--- {} ---", chrono::Local::now().format("%H:%M:%S"));
                    print_listing(ctx, &subs?)?;
                }
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

pub async fn refresh(ctx: &AppContext) -> Result<()> {
    ctx.manager.refresh_subscriptions().await?;
    let count = ctx.store.query(&SubscriptionQuery::all())?.len();
    println!("Synced {} subscriptions", count);
    Ok(())
}

pub async fn subscribe(ctx: &AppContext, name: &str) -> Result<()> {
    // Resolve the canonical name when online; offline the raw name is queued.
    let subreddit = match ctx.remote.find_subreddit(name).await {
        Ok(subreddit) => subreddit,
        Err(e) if e.is_not_found() => return Err(e),
        Err(e) => {
            tracing::debug!("Could not resolve r/{}: {}", name, e);
            Subreddit::new(name)
        }
    };

    ctx.manager.subscribe(&subreddit).await?;

    match ctx.store.get(&subreddit.display_name)? {
        Some(sub) if sub.is_subscribe_pending() => {
            println!("Queued subscribe to r/{} (will retry)", sub.name)
        }
        _ => println!("Subscribed to r/{}", subreddit.display_name),
    }
    Ok(())
}

pub async fn unsubscribe(ctx: &AppContext, name: &str) -> Result<()> {
    let sub = find_local(ctx, name)?;
    ctx.manager.unsubscribe(&sub).await?;

    match ctx.store.get(&sub.name)? {
        Some(_) => println!("Queued unsubscribe from r/{} (will retry)", sub.name),
        None => println!("Unsubscribed from r/{}", sub.name),
    }
    Ok(())
}

pub fn set_hidden(ctx: &AppContext, name: &str, hidden: bool) -> Result<()> {
    let sub = find_local(ctx, name)?;
    ctx.manager.set_hidden(&sub, hidden)?;

    if hidden {
        println!("Hid r/{}", sub.name);
    } else {
        println!("Unhid r/{}", sub.name);
    }
    Ok(())
}

pub async fn sync_pending(ctx: &AppContext) -> Result<()> {
    let report = ctx.manager.execute_pending_subscribes_and_unsubscribes().await?;
    print_report(&report);
    Ok(())
}

pub fn print_report(report: &ReplayReport) {
    if report == &ReplayReport::default() {
        println!("Nothing pending");
        return;
    }

    for name in &report.replayed {
        println!("  ok      r/{}", name);
    }
    for name in &report.still_pending {
        println!("  retry   r/{}", name);
    }
    for (name, reason) in &report.failed {
        eprintln!("  failed  r/{}: {}", name, reason);
    }
}

pub fn clear(ctx: &AppContext) -> Result<()> {
    ctx.manager.remove_all()?;
    println!("Removed all subscriptions");
    Ok(())
}

pub fn show_default(ctx: &AppContext) -> Result<()> {
    println!("{}", ctx.manager.default_subreddit()?);
    Ok(())
}

pub fn set_default(ctx: &AppContext, name: &str) -> Result<()> {
    let sub = find_local(ctx, name)?;
    ctx.manager.set_as_default(&sub)?;
    println!("Default subreddit is now r/{}", sub.name);
    Ok(())
}

pub fn reset_default(ctx: &AppContext) -> Result<()> {
    ctx.manager.reset_default_subreddit()?;
    println!("Default subreddit reset to {}", ctx.manager.default_subreddit()?);
    Ok(())
}
