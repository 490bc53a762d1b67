//! Webhook consumption details: event filtering, ref derivation, and the
//! status-code contract of the invalidation surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use chiaro::auth::ViewerAuth;
use chiaro::cache::DocCache;
use chiaro::docs::invalidation::InvalidationService;
use chiaro::docs::renderer::{BlueprintRenderer, RendererError};
use chiaro::docs::{DocDefaults, DocService};
use chiaro::github::{ContentFetcher, FetchError, FetchOutcome};
use chiaro::http::{AppState, build_router};

struct FixedFetcher;

#[async_trait]
impl ContentFetcher for FixedFetcher {
    async fn fetch_file(
        &self,
        _owner_repo: &str,
        _git_ref: &str,
        _path: &str,
    ) -> Result<FetchOutcome, FetchError> {
        Ok(FetchOutcome::Found(b"# API".to_vec()))
    }
}

struct PlainRenderer;

impl BlueprintRenderer for PlainRenderer {
    fn render(&self, source: &str) -> Result<String, RendererError> {
        Ok(format!("<main>{source}</main>"))
    }
}

fn build_app() -> (Router, Arc<DocCache>) {
    let cache = Arc::new(DocCache::new());
    let docs = Arc::new(DocService::new(
        cache.clone(),
        Arc::new(FixedFetcher),
        Arc::new(PlainRenderer),
        DocDefaults {
            owner: None,
            docs_path: "apiary.apib".to_string(),
        },
        true,
    ));
    let invalidation = Arc::new(InvalidationService::new(
        cache.clone(),
        "apiary.apib".to_string(),
    ));
    let auth = Arc::new(ViewerAuth::new(&[]));

    let router = build_router(AppState {
        docs,
        invalidation,
        auth,
    });
    (router, cache)
}

async fn seed(app: &Router, uri: &str) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("seed completes");
    assert_eq!(response.status(), StatusCode::OK);
}

fn delivery(event_type: Option<&str>, payload: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/hooks/github")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(event_type) = event_type {
        builder = builder.header("x-github-event", event_type);
    }
    builder
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn non_push_events_are_acknowledged_without_evicting() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(
            Some("issues"),
            r#"{"action":"opened","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn ping_deliveries_succeed() {
    let (app, _cache) = build_app();

    let response = app
        .oneshot(delivery(Some("ping"), r#"{"zen":"Keep it logically awesome."}"#))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn a_three_segment_ref_evicts_its_branch() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api?ref=develop").await;

    let response = app
        .clone()
        .oneshot(delivery(
            Some("push"),
            r#"{"ref":"refs/heads/develop","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn a_single_segment_ref_falls_back_to_master() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(
            Some("push"),
            r#"{"ref":"develop","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn an_absent_ref_falls_back_to_master() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(
            Some("push"),
            r#"{"repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn a_push_to_another_ref_leaves_entries_alone() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(
            Some("push"),
            r#"{"ref":"refs/heads/develop","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn pushes_succeed_even_when_nothing_was_cached() {
    let (app, cache) = build_app();

    let response = app
        .oneshot(delivery(
            Some("push"),
            r#"{"ref":"refs/heads/master","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn deliveries_without_an_event_header_are_treated_as_pushes() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(
            None,
            r#"{"ref":"refs/heads/master","repository":{"full_name":"acme/api"}}"#,
        ))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn malformed_push_payloads_are_rejected() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    let response = app
        .clone()
        .oneshot(delivery(Some("push"), r#"{"repository":{}}"#))
        .await
        .expect("delivery completes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn repeated_pushes_are_idempotent_over_http() {
    let (app, cache) = build_app();
    seed(&app, "/docs/acme/api").await;

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(delivery(
                Some("push"),
                r#"{"ref":"refs/heads/master","repository":{"full_name":"acme/api"}}"#,
            ))
            .await
            .expect("delivery completes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert!(cache.is_empty());
}
