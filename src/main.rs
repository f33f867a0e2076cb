use clap::Parser;
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use recipebox_server::config::AppConfig;
use recipebox_server::db;
use recipebox_server::version::VERSION;
use recipebox_server::web::create_router;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    init_logging();
    info!("Starting recipebox server, version: {}", VERSION);

    let config = Arc::new(AppConfig::load(args.config.as_deref())?);

    let mut opt = ConnectOptions::new(config.database_url.clone());
    opt.max_connections(10);
    let db = Database::connect(opt).await?;

    // SQLite gets its schema from the entity definitions; Postgres schemas
    // are managed by external migration tooling.
    if config.database_url.starts_with("sqlite:") {
        db::schema::create_schema(&db).await?;
    }

    let router = create_router(db, config.clone());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("HTTP server listening on {}", config.listen_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
