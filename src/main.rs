// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! DevQuest Feed API Server
//!
//! Serves the aggregated activity feed, backed by Firestore or, without a
//! GCP project, by an in-memory store.

use devquest_feed::{
    config::Config,
    db::{FirestoreDb, MemoryStore},
    services::{CachedUserDirectory, FeedSources},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting DevQuest feed API");

    let sources = match &config.gcp_project_id {
        Some(project_id) => {
            let db = FirestoreDb::new(project_id)
                .await?
                .with_poll_interval(config.poll_interval);
            let db = Arc::new(db);
            FeedSources {
                realtime: db.clone(),
                paginated: db.clone(),
                cursors: db.clone(),
                directory: Arc::new(CachedUserDirectory::new(db)),
            }
        }
        None => {
            tracing::warn!("GCP_PROJECT_ID not set, using in-memory activity store");
            let store = Arc::new(MemoryStore::new());
            FeedSources {
                realtime: store.clone(),
                paginated: store.clone(),
                cursors: store.clone(),
                directory: Arc::new(CachedUserDirectory::new(store)),
            }
        }
    };

    let (state, controller) = devquest_feed::start_feed(config.clone(), sources);

    // Build router
    let app = devquest_feed::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("devquest_feed=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
