// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use webhook_api::config::Settings;
use webhook_api::models::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    webhook_api::init_tracing(settings.log_format);

    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = webhook_api::app(state.clone());

    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(
        %addr,
        owner = %settings.repo_owner,
        repo = %settings.repo_name,
        suite = %settings.suite_filename,
        scratch_root = %settings.scratch_root.display(),
        "Webhook API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !state.tasks.is_empty() {
        info!(in_flight = state.tasks.len(), "Waiting for event runs to finish");
    }
    state.drain().await;

    info!("Webhook API stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            tracing::warn!(error = %e, "Cannot listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
