use std::{process, sync::Arc};

use chiaro::{
    auth::ViewerAuth,
    cache::DocCache,
    config,
    docs::{DocDefaults, DocService, invalidation::InvalidationService, renderer},
    github::GithubContentFetcher,
    http::{self, AppState},
    telemetry,
};
use thiserror::Error;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Telemetry(#[from] telemetry::TelemetryError),
    #[error("failed to construct GitHub client: {0}")]
    Github(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_startup_error(&error);
        process::exit(1);
    }
}

fn report_startup_error(error: &StartupError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "startup error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "startup error");
    });
}

async fn run() -> Result<(), StartupError> {
    let (_cli, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    if settings.auth.viewer_tokens.is_empty() {
        warn!("No viewer tokens configured; the documentation surface is open");
    }

    let fetcher = Arc::new(
        GithubContentFetcher::new(&settings.github)
            .map_err(|err| StartupError::Github(err.to_string()))?,
    );
    let blueprint_renderer = Arc::new(renderer::MarkdownBlueprintRenderer::new());
    let cache = Arc::new(DocCache::new());

    let docs = Arc::new(DocService::new(
        cache.clone(),
        fetcher,
        blueprint_renderer,
        DocDefaults {
            owner: settings.docs.default_owner.clone(),
            docs_path: settings.docs.default_path.clone(),
        },
        settings.cache.enabled,
    ));
    let invalidation = Arc::new(InvalidationService::new(
        cache,
        settings.docs.default_path.clone(),
    ));
    let auth = Arc::new(ViewerAuth::new(&settings.auth.viewer_tokens));

    let router = http::build_router(AppState {
        docs,
        invalidation,
        auth,
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr).await?;
    info!(
        addr = %settings.server.addr,
        cache_enabled = settings.cache.enabled,
        "chiaro listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
