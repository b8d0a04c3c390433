//! Review Roster - team roster and pull request reviewer assignment.
//!
//! Tracks teams, users and pull requests. Creating a pull request assigns up
//! to two random active teammates of the author as reviewers; a reviewer can
//! later be swapped for another eligible teammate until the pull request is
//! merged.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

use config::Config;
use error::AppError;
use services::api::AppState;
use services::{PullRequestService, ReviewerPicker};
use std::sync::Arc;

/// Open the database and build the shared request state.
pub async fn build_state(config: &Config) -> Result<AppState, AppError> {
    let pool = db::initialize(&config.db_path).await?;

    let picker = match config.reviewer_seed {
        Some(seed) => {
            log::info!("Reviewer selection seeded with {}", seed);
            ReviewerPicker::seeded(seed)
        }
        None => ReviewerPicker::from_entropy(),
    };

    Ok(AppState {
        db: pool.clone(),
        pull_requests: Arc::new(PullRequestService::new(pool, picker)),
    })
}

/// Run the service until Ctrl-C.
pub async fn run(config: Config) -> Result<(), AppError> {
    let state = build_state(&config).await?;
    let server = services::server::start_server(config.listen_addr(), state.clone()).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }

    server.shutdown().await;
    state.db.close().await;
    Ok(())
}
