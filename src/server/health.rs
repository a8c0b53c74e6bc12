//! Health check endpoint for liveness probes.

use std::error::Error as StdError;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;
use crate::effects::GitHubInterpreter;
use crate::owners::OwnersResolver;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Health {
    pub status: &'static str,
    /// Repositories with a running worker.
    pub workers: usize,
}

/// Returns 200 with the number of live workers while the server is up.
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"status":"ok","workers":2}
/// ```
pub async fn health_handler<G, O>(State(app_state): State<AppState<G, O>>) -> Json<Health>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver + Send + Sync + 'static,
{
    Json(Health {
        status: "ok",
        workers: app_state.dispatcher().worker_count().await,
    })
}
