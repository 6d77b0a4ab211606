// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process::ExitCode;

use tokengate::{
    api::router,
    config::SecurityConfig,
    logging::init_logging,
    state::AppState,
};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match SecurityConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: SecurityConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::from_config(&config)?;

    if let Some(seed) = config.seed_user.clone() {
        info!(username = %seed.username, authorities = ?seed.authorities, "Seeding principal");
        state.principals.insert(seed.into_principal()).await;
    }

    if config.csrf_secret.is_none() {
        warn!("CSRF_SECRET not set, using a random key for this process");
    }

    if cfg!(feature = "dev") {
        warn!("Development routes enabled: /dev/token issues tokens without a password");
    }

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!(
        %addr,
        algorithm = %config.jwt_algorithm,
        validity_secs = config.jwt_validity.num_seconds(),
        "tokengate listening (docs at /docs)"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
