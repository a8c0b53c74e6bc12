//! Webhook endpoint handler.
//!
//! Parses GitHub webhook deliveries and hands relevant events to the
//! per-repo workers before returning 202 Accepted. The actual processing
//! happens asynchronously.

use std::error::Error as StdError;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::effects::GitHubInterpreter;
use crate::owners::OwnersResolver;
use crate::webhooks::{ParseError, parse_webhook};
use crate::worker::{DispatchError, Dispatched};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID. Only used for logging.
const HEADER_DELIVERY: &str = "x-github-delivery";

/// Errors that can occur when accepting a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// The payload does not match the announced event type.
    #[error("malformed payload: {0}")]
    Malformed(#[from] ParseError),

    /// The event could not be handed to a worker.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::Malformed(_) => StatusCode::BAD_REQUEST,
            WebhookError::Dispatch(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        (status, self.to_string()).into_response()
    }
}

/// Webhook handler.
///
/// # Response
///
/// - 202 Accepted: event queued, or ignored because the bot does not handle
///   it (unknown event type, irrelevant action, unwatched repository)
/// - 400 Bad Request: missing `X-GitHub-Event` or malformed payload
/// - 503 Service Unavailable: the repository's worker has stopped
///
/// ```ignore
/// POST /webhook HTTP/1.1
/// X-GitHub-Event: issue_comment
/// Content-Type: application/json
///
/// {"action": "created", "comment": {...}, "issue": {...}, "repository": {...}}
///
/// HTTP/1.1 202 Accepted
/// ```
pub async fn webhook_handler<G, O>(
    State(app_state): State<AppState<G, O>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, &'static str), WebhookError>
where
    G: GitHubInterpreter + Send + Sync + 'static,
    G::Error: StdError + Send + Sync + 'static,
    O: OwnersResolver + Send + Sync + 'static,
{
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = get_header(&headers, HEADER_DELIVERY).unwrap_or_default();

    debug!(delivery_id = %delivery_id, event_type = %event_type, "Received webhook");

    let event = match parse_webhook(&event_type, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!(delivery_id = %delivery_id, event_type = %event_type, "Ignoring event");
            return Ok((StatusCode::ACCEPTED, "Accepted (ignored)"));
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Malformed webhook payload");
            return Err(e.into());
        }
    };

    let repo = event.repo_id().clone();
    match app_state.dispatcher().dispatch(event).await? {
        Dispatched::Queued => {
            info!(
                delivery_id = %delivery_id,
                repo = %repo,
                event_type = %event_type,
                "Webhook queued"
            );
            Ok((StatusCode::ACCEPTED, "Accepted"))
        }
        Dispatched::NotWatched => Ok((StatusCode::ACCEPTED, "Accepted (ignored)")),
    }
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_reports_missing_name() {
        let headers = HeaderMap::new();
        let err = get_header(&headers, HEADER_EVENT).unwrap_err();
        assert_eq!(err.to_string(), "missing required header: x-github-event");
    }

    #[test]
    fn errors_map_to_status_codes() {
        let malformed = parse_webhook("issue_comment", b"{}").unwrap_err();
        assert_eq!(
            WebhookError::Malformed(malformed).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::Dispatch(DispatchError::ChannelClosed)
                .into_response()
                .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
