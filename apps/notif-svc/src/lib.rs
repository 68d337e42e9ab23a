//! Notification dispatch service.
//!
//! One process hosts both halves of the pipeline:
//!
//! ```text
//! POST /notif-svc/v1/create
//!   ↓ (validate)
//! NATS JetStream (NOTIFS stream, work-queue retention)
//!   ↓ (durable pull consumer, batches of 5)
//! Worker<Notification, EmailProcessor>
//!   ↓ (3 attempts, 2s apart)
//! SMTP delivery
//! ```
//!
//! Shutdown is cooperative: SIGINT/SIGTERM flips a shared watch flag,
//! the HTTP server stops accepting requests, the worker finishes its
//! current batch and exits, then the NATS connection is drained.

mod api;
mod config;
mod state;

use std::sync::Arc;

use eyre::{Result, WrapErr};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use core_config::{Environment, FromEnv};
use email::{EmailProcessor, EmailSender, Mailer, NotifStream, Notification, RetryPolicy, SmtpConfig, SmtpSender};
use messaging::{ensure_stream, Publisher, Worker, WorkerConfig};

use config::Config;
use state::AppState;

pub use api::router;
pub use state::AppState as ServiceState;

/// Run the service until a shutdown signal arrives.
pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    core_config::tracing::init_tracing(&config.environment);

    info!(environment = ?config.environment, "Starting notification service");

    info!(url = %config.nats_url, "Connecting to NATS");
    let nats_client = async_nats::connect(&config.nats_url)
        .await
        .wrap_err_with(|| format!("Failed to connect to NATS at {}", config.nats_url))?;
    let jetstream = async_nats::jetstream::new(nats_client.clone());

    let worker_config = WorkerConfig::from_stream::<NotifStream>();
    ensure_stream(&jetstream, &worker_config)
        .await
        .wrap_err("Failed to ensure notification stream")?;

    let publisher = Publisher::from_config(jetstream.clone(), &worker_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    // SMTP adapter: authenticated relay in production, local Mailpit
    // otherwise.
    let smtp_config = match config.environment {
        Environment::Production => SmtpConfig::from_env()?,
        Environment::Development => SmtpConfig::mailpit(),
    };
    let sender = SmtpSender::new(smtp_config).wrap_err("Failed to create SMTP transport")?;

    let worker_handle = spawn_worker(
        jetstream,
        sender,
        RetryPolicy::default(),
        worker_config,
        shutdown_rx.clone(),
    );

    let state = AppState::new(publisher);
    let app = api::router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Intake listening");

    let mut http_rx = shutdown_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*http_rx.borrow() {
                if http_rx.changed().await.is_err() {
                    break;
                }
            }
            info!("Intake shutting down");
        })
        .await
        .wrap_err("Intake server failed")?;

    // The worker sees the same flag; wait for it to finish its batch.
    worker_handle
        .await
        .wrap_err("Worker task panicked")?
        .wrap_err("Worker failed")?;

    nats_client
        .drain()
        .await
        .wrap_err("Failed to drain NATS connection")?;

    info!("Notification service stopped");
    Ok(())
}

/// Start the queue worker on its own task.
///
/// Public with a generic sender so end-to-end tests can swap the SMTP
/// adapter for a recording double.
pub fn spawn_worker<S: EmailSender + 'static>(
    jetstream: async_nats::jetstream::Context,
    sender: S,
    policy: RetryPolicy,
    worker_config: WorkerConfig,
    shutdown_rx: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<Result<(), messaging::QueueError>> {
    let mailer = Mailer::new(Arc::new(sender), policy, shutdown_rx.clone());
    let processor = EmailProcessor::new(mailer);
    let worker: Worker<Notification, _> = Worker::new(jetstream, processor, worker_config);

    // Log here, when it happens: the handle is not joined until the
    // intake server has already stopped.
    tokio::spawn(async move {
        let result = worker.run(shutdown_rx).await;
        if let Err(e) = &result {
            error!(error = %e, "Worker stopped with an error");
        }
        result
    })
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}
