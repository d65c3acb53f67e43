//! Portal service entry point.

use portal_service::config::PortalConfig;
use portal_service::services::init_metrics;
use portal_service::startup::Application;
use portal_service::utils::password::hash_password;

use service_core::observability::init_tracing;
use std::io::BufRead;
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

/// `portal-service hash-password [PASSWORD]` prints the argon2 string for
/// `auth.password_hash`. Without an argument the password is read from stdin.
fn print_password_hash(argument: Option<String>) -> anyhow::Result<()> {
    let password = match argument {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    println!("{}", hash_password(&password)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        return match command.as_str() {
            "hash-password" => print_password_hash(args.next()),
            other => anyhow::bail!("Unknown command: {} (expected `hash-password`)", other),
        };
    }

    let config = PortalConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "portal-service",
        &config.observability.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        storage = ?config.storage.backend,
        operator = %config.auth.username,
        "Starting portal-service"
    );

    init_metrics();

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to build application");
        anyhow::anyhow!("Application build error: {}", e)
    })?;

    app.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}
