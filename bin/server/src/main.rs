use membrane_server::{Server, ServerConfig};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        service_address = %config.service_address,
        min_workers = config.min_workers,
        max_workers = config.max_workers,
        http_forward = config.http_forward,
        "loaded configuration"
    );

    let server = Server::new(config);
    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(report) => {
            tracing::error!(error = %report, "failed to start");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    match server.run(listener, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            tracing::error!(error = %report, "membrane stopped");
            ExitCode::FAILURE
        }
    }
}
