use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use zumbafit::api::{create_routes, AppState};
use zumbafit::auth::AuthService;
use zumbafit::config::{run_migrations, AppConfig, DatabaseConfig};
use zumbafit::services::{load_posture_model, FrameExtractionService, VideoAnalysisService};

#[derive(Parser)]
#[command(name = "zumbafit")]
#[command(about = "Posture analysis and feedback server for ZumbaFit Pro", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create an admin account, or reset its email and password
    SeedAdmin {
        username: String,
        email: String,
        #[arg(env = "ZUMBAFIT_ADMIN_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let db_config = DatabaseConfig::from_env()?;
    let pool = db_config.create_pool().await?;
    run_migrations(&pool).await?;
    info!("Database ready");

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config, pool).await,
        Commands::SeedAdmin {
            username,
            email,
            password,
        } => {
            let auth_service = AuthService::new(pool, &config.jwt_secret);
            let admin = auth_service
                .seed_admin(&username, &email, &password)
                .await
                .context("Failed to seed admin account")?;
            info!("Admin '{}' (id {}) seeded", admin.username, admin.admin_id);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, pool: sqlx::PgPool) -> Result<()> {
    // A missing or broken model switches the process to simulated analysis
    let classifier = match load_posture_model(&config.model_path) {
        Ok(classifier) => Some(classifier),
        Err(e) => {
            warn!("Posture model unavailable: {}", e);
            None
        }
    };
    let analysis_service = VideoAnalysisService::new(
        classifier,
        FrameExtractionService::with_ffmpeg_path(config.ffmpeg_path.clone()),
    );

    let state = AppState::new(pool, analysis_service, &config);
    state.storage_service.ensure_upload_dir().await?;

    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("ZumbaFit server starting on http://{}", address);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
