use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_relay::AppState;
use agent_relay::agent::HttpAgentClient;
use agent_relay::config::{Config, Credentials, RuntimeEnv};
use agent_relay::routes;

#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(about = "HTTP relay for a managed AI agent service")]
#[command(version)]
struct Cli {
    /// Agent runtime region
    #[arg(long, env = "AGENT_REGION")]
    region: String,

    /// Agent identifier
    #[arg(long, env = "AGENT_ID")]
    agent_id: String,

    /// Agent alias identifier
    #[arg(long, env = "AGENT_ALIAS_ID")]
    agent_alias_id: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Runtime environment, selects credential resolution
    #[arg(long, env = "APP_ENV", value_enum, default_value = "cloud")]
    env: RuntimeEnv,

    /// Credential profile name (local environment)
    #[arg(long, env = "AGENT_PROFILE", default_value = "default")]
    profile: String,

    /// Agent runtime base URL (defaults to the regional endpoint)
    #[arg(long, env = "AGENT_ENDPOINT")]
    endpoint: Option<String>,

    /// Model used by the direct completion endpoint
    #[arg(long, env = "MODEL_ID", default_value = "text-express-v1")]
    model_id: String,

    /// Directory of static assets to serve
    #[arg(long, env = "PUBLIC_DIR", default_value = "public")]
    public_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "agent_relay=debug,tower_http=debug"
    } else {
        "agent_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let endpoint = cli
        .endpoint
        .clone()
        .unwrap_or_else(|| Config::default_endpoint(&cli.region));

    let config = Arc::new(Config {
        region: cli.region,
        agent_id: cli.agent_id,
        agent_alias_id: cli.agent_alias_id,
        model_id: cli.model_id,
        endpoint,
        runtime_env: cli.env,
        profile: cli.profile,
        public_dir: cli.public_dir,
    });

    let credentials = Credentials::resolve(&config).context("resolving agent credentials")?;
    let agent = HttpAgentClient::new(&config, credentials)?;

    let state = AppState {
        config: Arc::clone(&config),
        agent: Arc::new(agent),
    };
    let app = routes::create_router(state);

    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port)
        .parse()
        .context("parsing bind address")?;

    info!(%addr, agent_id = %config.agent_id, region = %config.region, "starting agent-relay");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
