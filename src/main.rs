use lplens::ledger::{JsonRpcLedger, LedgerClient};
use lplens::orchestration::Analyzer;
use lplens::prices::{LlamaPriceFeed, PriceFeed};
use lplens::{api, config::Config};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Upstream clients
    let ledger: Arc<dyn LedgerClient> = match JsonRpcLedger::new(
        config.rpc_url.clone(),
        config.request_timeout(),
        config.retry_max_elapsed(),
    ) {
        Ok(l) => Arc::new(l),
        Err(e) => {
            eprintln!("Failed to create ledger client: {}", e);
            std::process::exit(1);
        }
    };
    let prices: Arc<dyn PriceFeed> = match LlamaPriceFeed::new(
        config.price_api_url.clone(),
        config.chain.clone(),
        config.request_timeout(),
        config.retry_max_elapsed(),
    ) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Failed to create price feed client: {}", e);
            std::process::exit(1);
        }
    };

    let analyzer = Arc::new(Analyzer::new(ledger, prices, config.scan_config()));
    tracing::info!(
        chain = %config.chain,
        chunk_size = config.log_chunk_size,
        max_chunks = config.max_log_chunks,
        "Analyzer ready"
    );

    // Create router
    let app = api::create_router(api::AppState::new(analyzer));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
