//! Push notification and flush-all handlers.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::debug;

use crate::docs::invalidation::PushEvent;
use crate::error::ErrorReport;

use super::AppState;

const EVENT_TYPE_HEADER: &str = "x-github-event";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HookQuery {
    all: Option<bool>,
}

/// Consume a repository delivery.
///
/// `?all=true` flushes the whole cache and answers 204. A push evicts its
/// ref and answers 200 whether or not anything was cached. Deliveries of
/// any other event type are acknowledged without touching the cache.
pub async fn receive(
    State(state): State<AppState>,
    Query(query): Query<HookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if query.all.unwrap_or(false) {
        state.invalidation.handle_flush_all();
        return StatusCode::NO_CONTENT.into_response();
    }

    // An absent header is treated as a push so that plain deliveries
    // without GitHub's envelope still invalidate.
    let event_type = headers
        .get(EVENT_TYPE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("push");
    if !event_type.eq_ignore_ascii_case("push") {
        debug!(event_type, "Ignoring non-push delivery");
        return StatusCode::OK.into_response();
    }

    let event: PushEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            let mut response =
                (StatusCode::BAD_REQUEST, "malformed push payload").into_response();
            ErrorReport::from_message(
                "http::hooks::receive",
                StatusCode::BAD_REQUEST,
                err.to_string(),
            )
            .attach(&mut response);
            return response;
        }
    };

    state.invalidation.handle_push(&event);
    StatusCode::OK.into_response()
}
