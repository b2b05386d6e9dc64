//! HTTP API module
//!
//! Exposes the controller's message surface over HTTP for settings panels
//! that live outside the process.

pub mod handlers;
pub mod responses;

use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controller::ControllerHandle;
use handlers::*;

/// Shared state of the HTTP handlers
#[derive(Debug, Clone)]
pub struct ApiState {
    pub controller: ControllerHandle,
    pub start_time: Instant,
}

impl ApiState {
    pub fn new(controller: ControllerHandle) -> Self {
        Self {
            controller,
            start_time: Instant::now(),
        }
    }
}

/// Create the HTTP router with all endpoints
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/settings", get(get_settings_handler).post(update_settings_handler))
        .route("/message", post(message_handler))
        .route("/badge", get(badge_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
