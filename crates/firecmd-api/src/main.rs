//! Fire-command assistant entry point.
//!
//! Binary name: `firecmd`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then runs
//! the gateway, the agent runtime server, or a one-shot command.

mod cli;
mod http;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use firecmd_infra::config::load_config;
use firecmd_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::{GatewayState, RuntimeState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides this default.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn,firecmd_api=info",
        1 => "info,firecmd_core=debug,firecmd_infra=debug",
        _ => "trace",
    };
    init_tracing(cli.otel, filter).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).await;

    match cli.command {
        Commands::Serve { bind } => {
            let state = GatewayState::init(&config)?;
            let addr = bind.unwrap_or_else(|| config.gateway.bind.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Gateway listening on {} -> {}",
                console::style("🔥").bold(),
                console::style(format!("http://{addr}")).cyan(),
                console::style(state.runtime.invocation_url()).dim()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            axum::serve(listener, http::router::build_gateway_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            println!("\n  Gateway stopped.");
        }

        Commands::Runtime { bind } => {
            let state = RuntimeState::init(&config)?;
            let addr = bind.unwrap_or_else(|| config.runtime.bind.clone());
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} {} runtime listening on {} (tools: {})",
                console::style("⚡").bold(),
                config.agent.name,
                console::style(format!("http://{addr}")).cyan(),
                state.factory.tools().names().join(", ")
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            axum::serve(listener, http::router::build_runtime_router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            println!("\n  Runtime stopped.");
        }

        Commands::Ask { prompt, actor, session } => {
            cli::ask::ask(&config, &prompt, &actor, &session).await?;
        }

        Commands::Load {
            dataset,
            input,
            bucket,
            index,
        } => {
            cli::load::load(&config, dataset, &input, bucket, index).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
