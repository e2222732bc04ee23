use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use snoosync::app::AppContext;
use snoosync::cli::{commands, Cli, Commands, DefaultAction};
use snoosync::config::Config;
use snoosync::daemon::{Daemon, DaemonConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::List { filter, hidden } => {
            commands::list(&ctx, &filter, hidden).await?;
        }
        Commands::Watch { filter, hidden } => {
            commands::watch(&ctx, &filter, hidden).await?;
        }
        Commands::Refresh => {
            commands::refresh(&ctx).await?;
        }
        Commands::Subscribe { name } => {
            commands::subscribe(&ctx, &name).await?;
        }
        Commands::Unsubscribe { name } => {
            commands::unsubscribe(&ctx, &name).await?;
        }
        Commands::Hide { name } => {
            commands::set_hidden(&ctx, &name, true)?;
        }
        Commands::Unhide { name } => {
            commands::set_hidden(&ctx, &name, false)?;
        }
        Commands::Sync => {
            commands::sync_pending(&ctx).await?;
        }
        Commands::Clear => {
            commands::clear(&ctx)?;
        }
        Commands::Default { action } => match action.unwrap_or(DefaultAction::Get) {
            DefaultAction::Get => commands::show_default(&ctx)?,
            DefaultAction::Set { name } => commands::set_default(&ctx, &name)?,
            DefaultAction::Reset => commands::reset_default(&ctx)?,
        },
        Commands::Daemon {
            interval,
            no_initial_sync,
        } => {
            let interval = interval.unwrap_or_else(|| ctx.config.sync.daemon_interval.clone());
            let config = DaemonConfig {
                interval_secs: DaemonConfig::parse_interval(&interval)?,
                sync_on_start: !no_initial_sync,
            };
            Daemon::new(ctx.manager.clone(), config).run().await?;
        }
    }

    Ok(())
}
