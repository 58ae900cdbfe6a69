use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{HttpUsersTransport, StoreEvent, UsersClient, UsersStore};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod render;

use commands::{run_command, Command, EditMode};
use config::load_settings;

#[derive(Parser, Debug)]
#[command(about = "Browse and edit a remote user directory")]
struct Args {
    #[arg(long, default_value = "users.toml")]
    config: PathBuf,
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Drop cached users the server no longer returns.
    #[arg(long)]
    prune: bool,
    /// Apply edits to the local directory only.
    #[arg(long)]
    local: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config)?;
    if let Some(url) = args.api_base_url {
        settings.api_base_url = url;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }
    settings.prune_missing_on_fetch |= args.prune;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = Arc::new(UsersStore::new(settings.fetch_reconcile()));
    let transport = HttpUsersTransport::new(&settings.api_base_url, settings.request_timeout())?;
    info!(base_url = %transport.base_url(), "using users api");
    let client = UsersClient::new(Arc::clone(&store), Arc::new(transport));

    let mut events = store.subscribe();
    let watcher = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Changed { action }) => debug!(action, "store changed"),
                Ok(StoreEvent::OperationSettled { operation, outcome }) => match outcome {
                    Ok(()) => debug!(operation = operation.as_str(), "operation succeeded"),
                    Err(err) => debug!(operation = operation.as_str(), %err, "operation failed"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "store watcher lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    // A failed fetch is shown through the store's error flag.
    let _ = client.fetch_users().await;

    let command = args.command.unwrap_or(Command::List);
    let mode = if args.local {
        EditMode::Local
    } else {
        EditMode::Remote
    };
    let command_name = command.name();
    let status = match run_command(&client, command, mode).await {
        Ok(status) => status,
        Err(err) => {
            warn!(command = command_name, "command failed: {err:#}");
            Some(format!("{err:#}"))
        }
    };

    let snapshot = store.snapshot().await;
    print!("{}", render::render_users(&snapshot, status.as_deref()));

    drop(client);
    drop(store);
    let _ = watcher.await;
    Ok(())
}
