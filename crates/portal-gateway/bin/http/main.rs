mod cli;

use crate::cli::{StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use portal_directory::{DirectoryOptions, DirectoryService};
use portal_gateway::{App, AppState, HttpMetrics, LookupMode};
use portal_generator::ThreadRandom;
use portal_storage::{DirectoryStore, PoolSettings, PostgresStore, SqliteStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    config.validate()?;

    portal_telemetry::init(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        lookup_mode = %config.lookup_mode,
        empty_rename = %config.empty_rename,
        alias_length = config.alias_length.get(),
        "starting portal HTTP server"
    );

    let settings = PoolSettings::builder()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .build();

    let options = DirectoryOptions::builder()
        .alias_length(config.alias_length)
        .generated_alias_retries(config.generated_alias_retries)
        .empty_rename(config.empty_rename.into())
        .store_timeout(config.store_timeout())
        .build();

    let server = Server {
        listen_addr: config.listen_addr,
        lookup_mode: config.lookup_mode.into(),
        shutdown_grace: config.shutdown_grace(),
        options,
    };

    match config.storage {
        StorageBackendArg::Postgres => {
            let store = PostgresStore::connect(&config.database_url, &settings)
                .await
                .context("failed to connect to postgres")?;
            if !config.skip_migrations {
                store.migrate().await.context("failed to run migrations")?;
            }
            let result = server.run(store.clone()).await;
            store.close().await;
            result
        }
        StorageBackendArg::Sqlite => {
            let store = SqliteStore::connect(&config.database_url, &settings)
                .await
                .context("failed to open sqlite database")?;
            if !config.skip_migrations {
                store.migrate().await.context("failed to run migrations")?;
            }
            let result = server.run(store.clone()).await;
            store.close().await;
            result
        }
    }
}

struct Server {
    listen_addr: SocketAddr,
    lookup_mode: LookupMode,
    shutdown_grace: Duration,
    options: DirectoryOptions,
}

impl Server {
    async fn run<S: DirectoryStore>(self, store: S) -> anyhow::Result<()> {
        let directory = DirectoryService::with_options(store, ThreadRandom, self.options);
        let metrics = HttpMetrics::new().context("failed to register metrics")?;
        let router = App::router(AppState::new(
            Arc::new(directory),
            self.lookup_mode,
            Arc::new(metrics),
        ));

        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .with_context(|| format!("failed to bind {}", self.listen_addr))?;
        info!(listen_addr = %listener.local_addr()?, "listening");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let mut serve = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        tokio::select! {
            result = &mut serve => return Ok(result??),
            _ = shutdown_signal() => {}
        }

        info!(grace = ?self.shutdown_grace, "shutting down, draining in-flight requests");
        let _ = shutdown_tx.send(());

        match tokio::time::timeout(self.shutdown_grace, &mut serve).await {
            Ok(result) => result??,
            Err(_) => {
                warn!("in-flight requests did not finish within the grace period");
                serve.abort();
            }
        }

        info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received SIGTERM"),
    }
}
