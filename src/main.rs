use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payment_bridge::application::assembler::TransactionAssembler;
use payment_bridge::application::router::SubmissionRouter;
use payment_bridge::config::BridgeConfig;
use payment_bridge::domain::ports::{LedgerQueryBox, NamingResolverBox};
use payment_bridge::infrastructure::compliance::HttpComplianceRelay;
use payment_bridge::infrastructure::federation::FederationClient;
use payment_bridge::infrastructure::horizon::HorizonClient;
use payment_bridge::interfaces::http;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the bridge TOML config file
    #[arg(long, env = "BRIDGE_CONFIG", default_value = "bridge.toml")]
    config: PathBuf,

    /// Overrides the port from the config file
    #[arg(long, env = "BRIDGE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::from_file(&cli.config).into_diagnostic()?;
    let port = cli.port.unwrap_or(config.port);

    let naming: NamingResolverBox = Box::new(FederationClient::new(&config.federation_scheme));
    let ledger: LedgerQueryBox = Box::new(HorizonClient::new(&config.horizon));
    let assembler = TransactionAssembler::new(&config.network_passphrase, config.base_fee);

    let mut payments = SubmissionRouter::new(naming, ledger, assembler);
    if let Some(compliance) = &config.compliance {
        info!(%compliance, "Compliance server configured");
        payments = payments.with_compliance(Box::new(HttpComplianceRelay::new(compliance)));
    }

    let app = http::router(Arc::new(payments), config.request_timeout());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    info!(%addr, horizon = %config.horizon, "Bridge server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    info!("Bridge server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
