use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod listener;
mod scanner;

use listener::{ListenOptions, LogNavigator, QrNavigation, Subscriber};
use scanner::Credentials;

#[derive(Parser)]
#[command(name = "checkin")]
#[command(about = "Front desk and kiosk client for QR check-ins")]
struct Cli {
    /// Base URL of the clinic server (e.g., http://localhost:3000)
    #[arg(long, env = "CHECKIN_BASE_URL", default_value = "http://localhost:3000")]
    base_url: String,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow check-in events and open each scanned student's record
    Listen {
        /// Value of the `auth-session` cookie of a signed-in user
        #[arg(long, env = "CHECKIN_SESSION_TOKEN", hide_env_values = true)]
        session_token: String,

        /// Start with QR navigation switched off
        #[arg(long)]
        no_qr_navigation: bool,

        /// Initial reconnect delay in seconds
        #[arg(long, default_value_t = 1)]
        retry_delay: u64,

        /// Upper bound on the reconnect delay in seconds
        #[arg(long, default_value_t = 30)]
        max_retry_delay: u64,
    },
    /// Report a badge scan from a kiosk
    #[command(group(ArgGroup::new("credentials").required(true).args(["api_key", "session_token"])))]
    Scan {
        #[arg(long)]
        student_id: String,

        #[arg(long, env = "CHECKIN_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        #[arg(long)]
        session_token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Listen {
            session_token,
            no_qr_navigation,
            retry_delay,
            max_retry_delay,
        } => {
            let options = ListenOptions {
                base_url: cli.base_url.clone(),
                session_token,
                retry_delay: Duration::from_secs(retry_delay),
                max_retry_delay: Duration::from_secs(max_retry_delay),
            };
            let navigation = QrNavigation::new(!no_qr_navigation);
            tokio::spawn(toggle_from_stdin(navigation.clone()));
            let mut subscriber = Subscriber::new(navigation, LogNavigator::new(&cli.base_url));

            info!("Listening for check-ins on {}", cli.base_url);
            tokio::select! {
                result = listener::listen(&options, &mut subscriber) => result?,
                _ = tokio::signal::ctrl_c() => info!("Stopped listening"),
            }
            Ok(())
        }
        Command::Scan {
            student_id,
            api_key,
            session_token,
        } => {
            let credentials = match (api_key, session_token) {
                (Some(key), _) => Credentials::ApiKey(key),
                (None, Some(token)) => Credentials::Session(token),
                (None, None) => anyhow::bail!("either --api-key or --session-token is required"),
            };

            let client = reqwest::Client::new();
            scanner::send_scan(&client, &cli.base_url, &student_id, &credentials).await?;
            info!("Scan for student {} accepted", student_id);
            Ok(())
        }
    }
}

/// Type `on` or `off` while listening to switch QR navigation
async fn toggle_from_stdin(navigation: QrNavigation) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        match line.trim() {
            "on" => navigation.set_enabled(true),
            "off" => navigation.set_enabled(false),
            "" => continue,
            other => {
                warn!("Unknown command {:?}, expected on or off", other);
                continue;
            }
        }
        info!(
            "QR navigation {}",
            if navigation.is_enabled() { "enabled" } else { "disabled" }
        );
    }
}
