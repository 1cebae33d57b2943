// Copyright 2025 Benchbot Contributors
// SPDX-License-Identifier: Apache-2.0

//! GitHub webhook service for Benchbot.
//!
//! Receives `pull_request` deliveries on `POST /github-hook` and hands
//! `opened`/`synchronize` events to the benchmark pipeline on a background
//! task. The delivery is acknowledged before the pipeline runs.

#![deny(unsafe_code)]

pub mod config;
pub mod middleware;
pub mod models;
pub mod routes;

use crate::config::LogFormat;
use crate::models::AppState;
use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the service router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::webhook::routes())
        .merge(routes::health::routes())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` selects the filter, `info` when unset.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
