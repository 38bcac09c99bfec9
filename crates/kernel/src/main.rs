//! Leadflow server and admin CLI.

use std::net::SocketAddr;

use anyhow::{Context, Result, bail};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use leadflow_kernel::models::{NewUser, User};
use leadflow_kernel::services::password;
use leadflow_kernel::{AppState, Config, db, routes};

/// Length of generated superuser passwords.
const GENERATED_PASSWORD_LEN: usize = 20;

#[derive(Parser)]
#[command(name = "leadflow", version, about = "Leadflow CRM server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create a superuser account.
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        /// Generated and printed once when omitted.
        #[arg(long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateSuperuser {
            username,
            full_name,
            password,
        } => create_superuser(&config, username, full_name, password).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!(port = config.port, "Starting leadflow");

    let state = AppState::new(&config)
        .await
        .context("failed to initialize application state")?;

    let cors = build_cors_layer(&config);

    // TraceLayer → CORS → routes
    let app = routes::api()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("failed to bind to address")?;

    info!(%addr, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

async fn create_superuser(
    config: &Config,
    username: String,
    full_name: String,
    password: Option<String>,
) -> Result<()> {
    let pool = db::create_pool(config).await?;
    db::run_migrations(&pool).await?;

    if User::find_by_username(&pool, &username).await?.is_some() {
        bail!("user {username:?} already exists");
    }

    let generated = password.is_none();
    let password = match password {
        Some(password) => {
            password::check_strength(&password)?;
            password
        }
        None => password::generate_password(GENERATED_PASSWORD_LEN),
    };

    let hashed_password = password::hash_password_blocking(password.clone())
        .await
        .context("failed to hash password")?;
    let user = User::create(
        &pool,
        NewUser {
            full_name,
            username,
            hashed_password,
            is_superuser: true,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "superuser created");
    if generated {
        println!("Generated password for {}: {password}", user.username);
    }

    Ok(())
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if config.cors_allowed_origins.len() == 1 && config.cors_allowed_origins[0] == "*" {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
