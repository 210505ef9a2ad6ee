use clap::{Parser, Subcommand};
use handpay::application::{EngineConfig, PaymentEngine};
use handpay::infrastructure::open_store;
use handpay::interfaces::csv::ledger_writer::LedgerWriter;
use handpay::interfaces::http;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "HANDPAY_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Currency code for new wallets.
    #[arg(long, global = true, env = "HANDPAY_CURRENCY", default_value = "EUR")]
    currency: String,

    /// Balance credited to a wallet at registration.
    #[arg(long, global = true, env = "HANDPAY_OPENING_BALANCE", default_value = "500.00")]
    opening_balance: Decimal,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON API.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "HANDPAY_LISTEN", default_value = "0.0.0.0:3000")]
        listen: SocketAddr,
    },
    /// Write the ledger chain to stdout as CSV.
    Export,
    /// Re-hash the ledger chain; exits non-zero if it is broken.
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    // Storage that cannot be opened is fatal.
    let store = open_store(cli.db_path.as_deref()).into_diagnostic()?;
    let engine = Arc::new(PaymentEngine::new(
        store,
        EngineConfig {
            currency: cli.currency,
            opening_balance: cli.opening_balance,
        },
    ));

    let outcome = match cli.command {
        Command::Serve { listen } => serve(Arc::clone(&engine), listen).await,
        Command::Export => export(&engine).await,
        Command::Verify => verify(&engine).await,
    };

    engine.shutdown().await.into_diagnostic()?;
    outcome
}

async fn serve(engine: Arc<PaymentEngine>, listen: SocketAddr) -> Result<()> {
    let app = http::router(engine);
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .into_diagnostic()?;
    tracing::info!("HandPay listening on http://{listen}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    tracing::info!("HandPay shut down gracefully");
    Ok(())
}

async fn export(engine: &PaymentEngine) -> Result<()> {
    let ledger = engine.ledger().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = LedgerWriter::new(stdout.lock());
    writer.write_ledger(&ledger).into_diagnostic()?;
    Ok(())
}

async fn verify(engine: &PaymentEngine) -> Result<()> {
    let report = engine.verify_chain().await.into_diagnostic()?;
    println!(
        "ledger ok: {} transactions, head {}",
        report.length, report.head
    );
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
