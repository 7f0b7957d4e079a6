mod runner;
mod scheduler;

use std::sync::Arc;

use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use ytledger_sync::SyncOutcome;

#[derive(Debug, Parser)]
#[command(name = "ytledger")]
#[command(about = "YouTube channel cost ledger")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the dashboard and ledger sheets, then run a first sync
    Setup {
        /// Only prepare the sheets
        #[arg(long)]
        no_sync: bool,
    },
    /// Run one sync pass now
    Sync {
        /// Sync into a throwaway in-memory workbook instead of the database
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the sync on the configured daily schedule until interrupted
    Schedule,
    /// Show recent sync runs
    Runs {
        /// Number of runs to list, newest first
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database accepts connections
    Ping,
    /// Apply pending schema migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = ytledger_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Setup { no_sync } => {
            let pool = connect(&config).await?;
            let job = ytledger_core::load_job_config(&config.job_path)?;
            let Some(lock) = ytledger_db::try_lock_workbook(&pool).await? else {
                anyhow::bail!("setup refused: another sync run holds the workbook");
            };
            let mut workbook = ytledger_db::PgWorkbook::new(pool.clone());
            let report =
                ytledger_sync::setup_workbook(&mut workbook, &job, Utc::now(), config.utc_offset())
                    .await?;
            lock.release().await?;
            println!(
                "setup: created {:?}, removed {:?}",
                report.created, report.removed
            );
            if let Some(month) = report.seeded {
                println!("setup: seeded dashboard month {month}");
            }
            if !no_sync {
                let outcome = runner::run_recorded(&pool, &config, "cli").await?;
                finish(&outcome)?;
            }
        }
        Commands::Sync { dry_run: true } => {
            let outcome = runner::dry_run(&config).await?;
            finish(&outcome)?;
        }
        Commands::Sync { dry_run: false } => {
            let pool = connect(&config).await?;
            let outcome = runner::run_recorded(&pool, &config, "cli").await?;
            finish(&outcome)?;
        }
        Commands::Schedule => {
            let pool = connect(&config).await?;
            let cron = config.sync_cron.clone();
            let mut scheduler = scheduler::build_scheduler(pool, Arc::new(config)).await?;
            tracing::info!(cron = %cron, "scheduler: daily sync registered");
            shutdown_signal().await;
            scheduler.shutdown().await?;
        }
        Commands::Runs { limit } => {
            let pool = connect(&config).await?;
            for run in ytledger_db::list_sync_runs(&pool, limit.max(1)).await? {
                println!("{}", runner::format_run(&run));
            }
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            let pool = ytledger_db::connect_pool(
                &config.database_url,
                ytledger_db::PoolConfig::from_app_config(&config),
            )
            .await?;
            ytledger_db::ping(&pool).await?;
            println!("database reachable");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            let pool = ytledger_db::connect_pool(
                &config.database_url,
                ytledger_db::PoolConfig::from_app_config(&config),
            )
            .await?;
            let applied = ytledger_db::run_migrations(&pool).await?;
            println!("applied {applied} migration(s)");
        }
    }

    Ok(())
}

async fn connect(config: &ytledger_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool = ytledger_db::connect_pool(
        &config.database_url,
        ytledger_db::PoolConfig::from_app_config(config),
    )
    .await?;
    ytledger_db::run_migrations(&pool).await?;
    Ok(pool)
}

/// Print the outcome; an aborted run exits non-zero.
fn finish(outcome: &SyncOutcome) -> anyhow::Result<()> {
    println!("sync {}", runner::summary(outcome));
    if let SyncOutcome::Aborted { stage, .. } = outcome {
        anyhow::bail!("sync aborted at {stage}");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
