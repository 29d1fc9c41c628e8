use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::migrate::Migrator;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod cookies;
mod error;
mod middleware;
mod models;
mod password;
mod repositories;
mod routes;
mod session;
mod sse;
mod state;
mod validation;

use common::database::{self, DatabaseConfig, init_pool};

use crate::{
    config::AppConfig,
    models::{NewUser, UserRole},
    repositories::{UserRepository, UserStore},
};

pub use crate::state::AppState;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "School health office server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create a staff account, e.g. the first administrator
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "CLINIC_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long, default_value = "admin")]
        role: UserRole,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting clinic service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    if config.run_migrations {
        database::run_migrations(&pool, &MIGRATOR).await?;
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, pool).await,
        Command::CreateUser {
            email,
            password,
            first_name,
            last_name,
            role,
        } => {
            let email = validation::normalize_email(&email);
            validation::validate_email(&email).map_err(anyhow::Error::msg)?;
            validation::validate_password(&password).map_err(anyhow::Error::msg)?;

            let password_hash = password::hash_password(&password)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

            let user = UserRepository::new(pool)
                .create(&NewUser {
                    email,
                    password_hash,
                    first_name,
                    last_name,
                    role,
                })
                .await?;

            info!("Created {} account {} ({})", user.role, user.email, user.id);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, pool: sqlx::PgPool) -> Result<()> {
    let listen_addr = config.listen_addr.clone();
    let app_state = AppState::from_pool(config, pool);

    info!("Clinic service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    info!("Clinic service listening on {}", listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Clinic service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
