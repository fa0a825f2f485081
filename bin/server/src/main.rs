use console_gate_addressing::AddressResolver;
use console_gate_platform_access::{JwksSessionIssuer, LoginSettings};
use console_gate_server::{app, auth::AppState, config::ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(environment = %config.environment, "Loaded configuration");

    let settings = match LoginSettings::from_options(config.login) {
        Ok(settings) => settings,
        Err(report) => {
            tracing::error!(error = %report, "invalid login configuration");
            std::process::exit(1);
        }
    };
    tracing::debug!(?settings, "validated login settings");

    let issuer = JwksSessionIssuer::new(&settings);
    let resolver =
        AddressResolver::new(config.environment).with_domains(config.routing.domains.clone());

    let app_state = Arc::new(AppState::new(
        settings,
        resolver,
        Arc::new(issuer),
        config.routing,
    ));

    let listener = match tokio::net::TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, address = %config.bind_address, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("listening on http://{}", config.bind_address);

    if let Err(e) = axum::serve(listener, app::router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
