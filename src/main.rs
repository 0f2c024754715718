use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

use srs_forge::config::Config;
use srs_forge::routes::create_routes;
use srs_forge::services::ai::build_adapter;
use srs_forge::services::documents::DocumentService;
use srs_forge::services::docx::DocxRenderer;
use srs_forge::services::srs::SrsService;
use srs_forge::services::storage::FileStorage;
use srs_forge::services::worker::Worker;
use srs_forge::state::AppState;

#[derive(Parser)]
#[command(name = "srs-forge", about = "BRD to SRS generation service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations and start the HTTP server (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = Database::connect(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    info!("Database migrations applied");

    if let Some(Command::Migrate) = cli.command {
        return Ok(());
    }

    let ai = build_adapter(&config.ai)?;
    info!("AI provider: {}", ai.name());

    let storage = FileStorage::new(&config.upload_dir).await?;
    tokio::fs::create_dir_all(&config.output_dir).await?;
    let renderer = Arc::new(DocxRenderer::new(&config.output_dir));

    let documents = Arc::new(DocumentService::new(db.clone(), storage, ai.clone(), renderer));
    let srs = Arc::new(SrsService::new(db, ai));

    let (worker, queue) = Worker::new(documents.clone());
    worker.recover().await;
    tokio::spawn(worker.run());

    let state = AppState {
        documents,
        srs,
        queue,
    };
    let app = create_routes(state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
