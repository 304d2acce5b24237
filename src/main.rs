use clap::Parser;
use prospectus::batch;
use prospectus::cli::Args;
use prospectus::config;
use prospectus::logging::setup_logging;
use prospectus::sink::JsonlSink;
use prospectus::validate::RankingLedger;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and setup logging first so startup logs are never dropped
    let config = config::load().expect("Failed to load config");
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("GIT_COMMIT_SHORT"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting prospectus"
    );

    let mut captures = match batch::load_manifest(&args.manifest) {
        Ok(captures) => captures,
        Err(e) => {
            error!(error = ?e, "failed to load capture manifest");
            return ExitCode::FAILURE;
        }
    };
    if let Some(year) = args.year {
        captures.retain(|c| c.source_year == year);
    }
    if captures.is_empty() {
        warn!("manifest contains no matching captures, nothing to do");
        return ExitCode::SUCCESS;
    }

    let sink = match JsonlSink::create(&args.output) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            error!(error = ?e, "failed to create output sink");
            return ExitCode::FAILURE;
        }
    };
    let ledger = Arc::new(RankingLedger::new());

    // Ctrl-C propagates to workers between documents.
    let (shutdown_tx, _) = broadcast::channel(1);
    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received, finishing in-flight documents");
                let _ = shutdown_tx.send(());
            }
        });
    }

    let summary = batch::run(
        captures,
        config.worker_count,
        config.document_timeout,
        Arc::clone(&ledger),
        sink,
        &shutdown_tx,
    )
    .await;

    for year in ledger.snapshot().years {
        info!(
            year = year.year,
            ranked_records = year.ranked_records,
            distinct_ranks = year.distinct_ranks,
            shared_ranks = year.shared_ranks,
            "ledger year summary"
        );
    }

    if summary.documents == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
