//! Document-serving handlers.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::error::{ErrorReport, HttpError};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IndexQuery {
    owner: Option<String>,
    repository: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

/// Landing route: with full coordinates it forwards to the docs route,
/// with partial coordinates it complains, otherwise it explains itself.
pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Response {
    let any_given =
        query.owner.is_some() || query.repository.is_some() || query.git_ref.is_some();

    if any_given {
        if let (Some(owner), Some(repository), Some(git_ref)) =
            (&query.owner, &query.repository, &query.git_ref)
        {
            return Redirect::to(&format!("/docs/{owner}/{repository}?ref={git_ref}"))
                .into_response();
        }

        let mut response = (
            StatusCode::BAD_REQUEST,
            "owner, repository and ref must all be provided",
        )
            .into_response();
        ErrorReport::from_message(
            "http::docs::index",
            StatusCode::BAD_REQUEST,
            "incomplete document coordinates in index query",
        )
        .attach(&mut response);
        return response;
    }

    let owner_hint = state
        .docs
        .defaults()
        .owner
        .clone()
        .unwrap_or_else(|| "<owner>".to_string());
    (
        StatusCode::OK,
        format!(
            "chiaro serves rendered API documentation.\n\
             Try /docs/{owner_hint}/<repository>?ref=master\n"
        ),
    )
        .into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DocQuery {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    path: Option<String>,
}

/// Serve the rendered blueprint for one repository at one ref.
pub async fn rendered_doc(
    State(state): State<AppState>,
    Path((owner, repository)): Path<(String, String)>,
    Query(query): Query<DocQuery>,
) -> Response {
    match state
        .docs
        .rendered_doc(
            &owner,
            &repository,
            query.git_ref.as_deref(),
            query.path.as_deref(),
        )
        .await
    {
        Ok(html) => ([(CONTENT_TYPE, "text/html; charset=utf-8")], html).into_response(),
        Err(failure) => HttpError::from(failure).into_response(),
    }
}
