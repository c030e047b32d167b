use anyhow::{Context, Result};
use clap::Parser;
use mcp_tool_server::config::ServerConfig;
use mcp_tool_server::mcp::AppState;
use mcp_tool_server::router::create_app_router;
use mcp_tool_server::tools::builtin::register_builtin_tools;
use mcp_tool_server::tools::ToolRegistry;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// The address to bind to.
    #[clap(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Serve without sessions.
    #[clap(long)]
    pub stateless: bool,

    /// Idle time in seconds after which a session expires.
    #[clap(long, default_value_t = 600)]
    pub session_timeout_secs: u64,
}

impl CliArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            stateless: self.stateless,
            session_timeout: Duration::from_secs(self.session_timeout_secs),
            ..ServerConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Register tools; any deployment error aborts startup
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry).context("Failed to register tools")?;
    info!("Registered {} tools", registry.tool_count());

    let state = Arc::new(AppState::new(cli_args.server_config(), registry));
    let app = create_app_router(state);

    let addr = SocketAddr::new(cli_args.host, cli_args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running on http://{}/mcp", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves when `signal` fires; never resolves if listening for it failed
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
