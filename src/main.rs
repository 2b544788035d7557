//! NATS account resolver

use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use nats_account_resolver::{
    config::Args,
    controller::{self, AccountResources, KubeResources, ReconcileController, WorkQueue},
    logging,
    nats::ConnectionLifecycle,
    server::{self, AccountServer, AppState},
    AccountDirectory,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("NATS: {}", args.nats.nats_url);
    info!("Probes: {}", args.probe_listen);
    info!(
        "Reconcile workers: {}, resync every {}s",
        args.reconcile_workers, args.resync_interval_secs
    );

    let directory = Arc::new(AccountDirectory::new());
    let lifecycle = Arc::new(ConnectionLifecycle::new());
    let cancel = CancellationToken::new();

    let resources: Arc<dyn AccountResources> = Arc::new(KubeResources::from_args(&args.kube)?);
    let queue = Arc::new(WorkQueue::new());
    let reconciler = Arc::new(ReconcileController::new(
        Arc::clone(&resources),
        Arc::clone(&directory),
        Arc::clone(&lifecycle),
    ));

    let probes = tokio::spawn(server::http::run(
        args.probe_listen,
        Arc::new(AppState {
            directory: Arc::clone(&directory),
            lifecycle: Arc::clone(&lifecycle),
        }),
        cancel.clone(),
    ));
    let resync = tokio::spawn(controller::run_resync(
        resources,
        Arc::clone(&queue),
        args.resync_interval(),
        cancel.clone(),
    ));
    let workers = tokio::spawn(reconciler.run(queue, args.reconcile_workers, cancel.clone()));

    let account_server = AccountServer::new(directory, lifecycle);
    let run_cancel = cancel.clone();
    let nats_args = args.nats.clone();
    let mut nats = tokio::spawn(async move { account_server.run(&nats_args, run_cancel).await });

    let exited_early = tokio::select! {
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
            None
        }
        result = &mut nats => Some(result),
    };

    cancel.cancel();
    let result = match exited_early {
        Some(result) => result,
        None => nats.await,
    };

    if let Err(e) = probes.await? {
        warn!("Probe server error: {}", e);
    }
    resync.await?;
    workers.await?;

    match result? {
        Ok(()) => {
            info!("Shut down cleanly");
            Ok(())
        }
        Err(e) => {
            error!("NATS account server failed: {}", e);
            Err(e.into())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
