//! HTTP server for the LGTM bot.
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries (returns 202 Accepted)
//! - `GET /health` - Returns 200 if server is running

use std::error::Error as StdError;
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use crate::effects::GitHubInterpreter;
use crate::owners::OwnersResolver;
use crate::worker::Dispatcher;

pub mod health;
pub mod webhook;

pub use health::health_handler;
pub use webhook::webhook_handler;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor.
pub struct AppState<G, O> {
    dispatcher: Arc<Dispatcher<G, O>>,
}

// Manual impl: the derive would demand `G: Clone` and `O: Clone`.
impl<G, O> Clone for AppState<G, O> {
    fn clone(&self) -> Self {
        AppState {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<G, O> AppState<G, O> {
    pub fn new(dispatcher: Arc<Dispatcher<G, O>>) -> Self {
        AppState { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher<G, O> {
        &self.dispatcher
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router<G, O>(app_state: AppState<G, O>) -> axum::Router
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver + Send + Sync + 'static,
{
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler::<G, O>))
        .route("/health", get(health_handler::<G, O>))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
