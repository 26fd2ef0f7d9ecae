use clap::Parser;
use dotenv::dotenv;
use foodgram_backend::server::config::ServerConfig;
use foodgram_backend::web::create_axum_router;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Listen address override, e.g. 0.0.0.0:8080
    #[arg(short, long)]
    listen: Option<String>,
}

fn init_logging() {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily("logs", "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info` with quiet query logging if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_logging();
    dotenv().ok();

    let mut config = ServerConfig::from_env()?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    let config = Arc::new(config);

    let mut connect_options = ConnectOptions::new(config.database_url.clone());
    connect_options.sqlx_logging(false);
    let db_pool = Database::connect(connect_options).await?;
    info!("Connected to database");

    let app_router = create_axum_router(db_pool, config.clone());

    info!("HTTP server listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app_router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}
