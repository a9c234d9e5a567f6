use std::path::Path;

use blobd_server::{BlobServer, ServerConfig};
use blobd_store::name::sort_names;
use blobd_store::{reconcile_with, NameIndex, ReconcileMode};
use colored::Colorize;
use tracing::info;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Ls(args) => cmd_ls(&args.root).await,
    }
}

/// Config file (if any) with command-line overrides applied.
fn resolve_config(args: &ServeArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = &args.root {
        config.store.root = root.clone();
    }
    Ok(config)
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let running = BlobServer::new(config).start().await?;
    println!(
        "{} blobd listening on {} (root: {}, {} objects)",
        "✓".green().bold(),
        running.local_addr().to_string().bold(),
        running.store().root().display(),
        running.store().len(),
    );

    shutdown_signal().await;
    info!("shutdown signal received");
    running.shutdown().await?;
    Ok(())
}

async fn cmd_ls(root: &Path) -> anyhow::Result<()> {
    for name in list_offline(root).await? {
        println!("{name}");
    }
    Ok(())
}

/// Object names under `root` in listing order. Read-only, so it is safe
/// next to a running server.
async fn list_offline(root: &Path) -> anyhow::Result<Vec<String>> {
    let index = NameIndex::new(root);
    reconcile_with(&index, ReconcileMode::ReadOnly).await?;
    let mut names = index.names();
    sort_names(&mut names);
    Ok(names)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
