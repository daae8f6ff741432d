//! Sales ETL - Main entry point
//!
//! With `--action` the pipeline runs once and the process exits; without it
//! the HTTP trigger is served until shutdown.

use anyhow::Result;
use clap::Parser;
use sales_common::logging::{init_logging, ConsoleStream, LogConfig, LogLevel};
use std::{net::SocketAddr, process, sync::Arc};
use tokio::signal;
use tracing::{error, info};

use sales_etl::{
    api::{self, AppState},
    config::Config,
    db::{self, PgWarehouse},
    pipeline::{Loader, Pipeline, RecordSource},
    storage::Storage,
};

#[derive(Parser, Debug)]
#[command(name = "sales-etl")]
#[command(author, version, about = "Aggregate sales exports by product and country")]
struct Cli {
    /// Action to perform once and exit: print or insert. Serves HTTP when omitted.
    #[arg(short, long, env = "SALES_ACTION")]
    action: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .console_stream(ConsoleStream::Stderr)
        .log_file_prefix("sales-etl")
        .filter_directives("tower_http=info,sqlx=warn,aws_config=warn,aws_smithy_runtime=warn")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.clone().merge_env() {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Ignoring invalid LOG_* settings: {}", e);
            log_config
        },
    };

    let log_guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            None
        },
    };

    if let Err(e) = run(cli).await {
        error!(error = %e, "sales-etl failed");
        eprintln!("{}", e);
        drop(log_guard);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    info!(
        source = %config.source.storage.location(),
        product_table = %config.warehouse.product_table,
        country_table = %config.warehouse.country_table,
        load_policy = %config.warehouse.load_policy,
        "Configuration loaded"
    );

    let pool = db::create_pool(&config.database).await?;
    info!("Successfully connected to the database");

    if config.database.run_migrations {
        db::run_migrations(&pool).await?;
    }

    let storage = Storage::new(&config.source.storage).await?;

    let source = RecordSource::new(
        Arc::new(storage),
        config.source.storage.location(),
        config.source.has_header,
    );
    let loader = Loader::new(
        Arc::new(PgWarehouse::new(pool.clone())),
        config.warehouse.load_policy,
    );
    let pipeline = Pipeline::new(source, loader, config.pipeline());

    let result = match cli.action {
        Some(action) => {
            let report = pipeline.run(&action).await?;
            print!("{}", report.render());
            Ok(())
        },
        None => serve(pipeline, &config).await,
    };

    pool.close().await;
    result
}

async fn serve(pipeline: Pipeline, config: &Config) -> Result<()> {
    let app = api::router(AppState::new(pipeline));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
