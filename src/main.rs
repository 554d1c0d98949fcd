//! tcode-gateway entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tcode_gateway::api::{create_router, AppState};
use tcode_gateway::auth::TokenAcquirer;
use tcode_gateway::config::Config;
use tcode_gateway::db::{OracleConnector, QueryGateway};
use tcode_gateway::metrics::MetricsCollector;
use tcode_gateway::secrets::{Credentials, RawSecrets};

/// Token and transaction-code gateway.
#[derive(Parser, Debug)]
#[command(name = "tcode-gateway")]
#[command(about = "HTTP gateway for OAuth2 service tokens and transaction-code lookups")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// Listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// Listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration (also reads .env, so it runs before logging setup)
    let config = Config::load()?;

    // Initialize logging
    let production = config.is_production();
    let filter = if args.verbose {
        EnvFilter::new("tcode_gateway=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if production {
                EnvFilter::new("info")
            } else {
                EnvFilter::new("tcode_gateway=debug,tower_http=debug,info")
            }
        })
    };

    tracing_subscriber::registry()
        .with(production.then(|| fmt::layer().json()))
        .with((!production).then(fmt::layer))
        .with(filter)
        .init();

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(config),
        Some(Command::Serve { port }) => cmd_serve(config, port.or(args.port)).await,
        None => cmd_serve(config, args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config(config: Config) -> anyhow::Result<()> {
    let raw = RawSecrets::from_env();
    let credentials = Credentials::decode(&raw);

    println!("======================================================================");
    println!("TCODE GATEWAY - CONFIGURATION CHECK");
    println!("======================================================================");
    println!("Port:              {}", config.port);
    println!("Production:        {}", config.is_production());
    match config.outbound_timeout() {
        Some(timeout) => println!("Outbound timeout:  {:?}", timeout),
        None => println!("Outbound timeout:  none"),
    }
    println!(
        "client_secret:     {} ({} chars decoded)",
        presence(&raw.client_secret),
        credentials.client_secret().chars().count()
    );
    println!(
        "username:          {} ({} chars decoded)",
        presence(&raw.username),
        credentials.username().chars().count()
    );
    println!(
        "password:          {} ({} chars decoded)",
        presence(&raw.password),
        credentials.password().chars().count()
    );

    if let Err(e) = config.validate() {
        println!("Configuration INVALID: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    println!("Configuration OK");
    Ok(())
}

fn presence(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "set"
    } else {
        "MISSING"
    }
}

/// Run the HTTP server until the process is terminated.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port_override {
        config.port = port;
    }

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    // Decode secrets once; shared read-only from here on
    let credentials = Arc::new(Credentials::decode(&RawSecrets::from_env()));

    let metrics = MetricsCollector::new()?;
    let tokens = TokenAcquirer::new(credentials.clone(), config.outbound_timeout())?;
    let queries = QueryGateway::new(
        Arc::new(OracleConnector),
        credentials,
        config.outbound_timeout(),
    );

    let router = create_router(AppState::new(metrics, tokens, queries));

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("App started on PORT {}", config.port);

    axum::serve(listener, router).await?;
    Ok(())
}
