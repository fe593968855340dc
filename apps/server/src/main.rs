use anyhow::Context;
use clap::{Parser, Subcommand};
use helpdesk_config::load as load_config;
use helpdesk_gateway::{create_router, GatewayState};
use helpdesk_runtime::{telemetry, BackendServices};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "helpdesk-backend")]
#[command(about = "Helpdesk backend server and admin tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Create or update the database schema and exit
    InitDb,
    /// Provision an agent account
    CreateAgent {
        email: String,
        password: String,
        display_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::InitDb => init_db().await,
        Commands::CreateAgent {
            email,
            password,
            display_name,
        } => create_agent(&email, &password, &display_name).await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting helpdesk backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = GatewayState::new(services.db_pool.clone(), services.authenticator.clone());
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(helpdesk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn init_db() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    println!("Initialized the database.");
    Ok(())
}

async fn create_agent(email: &str, password: &str, display_name: &str) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let agent = services
        .authenticator
        .create_agent(email, password, display_name)
        .await
        .context("failed to provision agent")?;

    println!("Created agent {} ({})", agent.display_name, agent.id);
    Ok(())
}
