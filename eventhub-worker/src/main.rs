//! # EventHub Worker
//!
//! Runs the hourly Reminder Scheduler outside the API process.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/eventhub \
//! MAIL_FROM=events@example.com \
//! cargo run -p eventhub-worker
//! ```

use eventhub_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    repository::PgRepository,
    telemetry::{init_tracing, LogFormat},
};
use eventhub_worker::{
    config::WorkerConfig,
    mail::SmtpMailer,
    reminder::ReminderPolicy,
    scheduler::ReminderScheduler,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("eventhub_worker=debug", LogFormat::from_env());

    tracing::info!(
        "EventHub Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = WorkerConfig::from_env()?;

    let pool = create_pool(
        &DatabaseConfig::new(&config.database_url)
            .with_max_connections(config.database_max_connections),
    )
    .await?;
    run_migrations(&pool).await?;

    let repo = Arc::new(PgRepository::new(pool.clone()));
    let mailer = Arc::new(SmtpMailer::new(&config.smtp, &config.mail_from)?);

    let scheduler = ReminderScheduler::new(repo, mailer)
        .with_policy(ReminderPolicy::from_lead_hours(config.reminder_lead_hours))
        .with_send_timeout(config.send_timeout);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    shutdown.cancel();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
        }
    });

    scheduler.run(shutdown).await;

    close_pool(pool).await;
    Ok(())
}
