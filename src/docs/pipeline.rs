//! The fetch → decode → render → normalize pipeline.
//!
//! Produces the final artifact for one set of document coordinates. The
//! pipeline has no side effects beyond the upstream fetch and never touches
//! the cache; population is the caller's concern.

use bytes::Bytes;
use thiserror::Error;

use crate::github::{ContentFetcher, FetchOutcome};

use super::renderer::BlueprintRenderer;

/// Where a document lives: repository, ref, and path inside the tree.
#[derive(Debug, Clone)]
pub struct DocCoordinates {
    pub owner_repo: String,
    pub git_ref: String,
    pub docs_path: String,
}

/// Why a render did not produce an artifact.
///
/// `Clone` because every caller collapsed onto a single flight receives the
/// identical failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderFailure {
    /// The document does not exist at these coordinates.
    #[error("document not found")]
    NotFound,
    /// The upstream fetch failed for any reason other than absence.
    #[error("fetching document failed: {0}")]
    Fetch(String),
    /// The fetched bytes are not valid UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Format(String),
    /// The renderer rejected the decoded source.
    #[error("rendering document failed: {0}")]
    Render(String),
}

/// Fetch, decode, render, and normalize one document.
pub async fn render_document(
    fetcher: &dyn ContentFetcher,
    renderer: &dyn BlueprintRenderer,
    coordinates: &DocCoordinates,
) -> Result<Bytes, RenderFailure> {
    let raw = match fetcher
        .fetch_file(
            &coordinates.owner_repo,
            &coordinates.git_ref,
            &coordinates.docs_path,
        )
        .await
    {
        Ok(FetchOutcome::Found(bytes)) => bytes,
        Ok(FetchOutcome::NotFound) => return Err(RenderFailure::NotFound),
        Err(err) => return Err(RenderFailure::Fetch(err.to_string())),
    };

    let source =
        String::from_utf8(raw).map_err(|err| RenderFailure::Format(err.to_string()))?;

    let html = renderer
        .render(&source)
        .map_err(|err| RenderFailure::Render(err.to_string()))?;

    // Deliberately a plain textual substitution: embedded asset links must
    // come out https no matter what markup surrounds them.
    let html = html.replace("http://", "https://");

    Ok(Bytes::from(html))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use crate::github::FetchError;

    use super::super::renderer::RendererError;
    use super::*;

    struct FixedFetcher(Result<FetchOutcome, FetchError>);

    #[async_trait]
    impl ContentFetcher for FixedFetcher {
        async fn fetch_file(
            &self,
            _owner_repo: &str,
            _git_ref: &str,
            _path: &str,
        ) -> Result<FetchOutcome, FetchError> {
            self.0.clone()
        }
    }

    struct EchoRenderer;

    impl BlueprintRenderer for EchoRenderer {
        fn render(&self, source: &str) -> Result<String, RendererError> {
            Ok(format!("<main>{source}</main>"))
        }
    }

    struct RefusingRenderer;

    impl BlueprintRenderer for RefusingRenderer {
        fn render(&self, _source: &str) -> Result<String, RendererError> {
            Err(RendererError::new("unparseable blueprint"))
        }
    }

    fn coordinates() -> DocCoordinates {
        DocCoordinates {
            owner_repo: "acme/api".to_string(),
            git_ref: "master".to_string(),
            docs_path: "apiary.apib".to_string(),
        }
    }

    #[tokio::test]
    async fn embedded_http_links_are_upgraded_to_https() {
        let fetcher = FixedFetcher(Ok(FetchOutcome::Found(
            b"see http://example.com/x and http://example.com/y".to_vec(),
        )));

        let artifact = render_document(&fetcher, &EchoRenderer, &coordinates())
            .await
            .expect("render succeeds");

        let html = String::from_utf8(artifact.to_vec()).expect("utf-8 artifact");
        assert!(html.contains("https://example.com/x"));
        assert!(html.contains("https://example.com/y"));
        assert!(!html.contains("http://"));
    }

    #[tokio::test]
    async fn missing_documents_surface_as_not_found() {
        let fetcher = FixedFetcher(Ok(FetchOutcome::NotFound));

        let outcome = render_document(&fetcher, &EchoRenderer, &coordinates()).await;
        assert_eq!(outcome, Err(RenderFailure::NotFound));
    }

    #[tokio::test]
    async fn upstream_failures_surface_as_fetch_errors() {
        let fetcher = FixedFetcher(Err(FetchError::Status(503)));

        let outcome = render_document(&fetcher, &EchoRenderer, &coordinates()).await;
        assert!(matches!(outcome, Err(RenderFailure::Fetch(_))));
    }

    #[tokio::test]
    async fn invalid_utf8_surfaces_as_format_error() {
        let fetcher = FixedFetcher(Ok(FetchOutcome::Found(vec![0xff, 0xfe, 0x00])));

        let outcome = render_document(&fetcher, &EchoRenderer, &coordinates()).await;
        assert!(matches!(outcome, Err(RenderFailure::Format(_))));
    }

    #[tokio::test]
    async fn renderer_rejections_surface_as_render_errors() {
        let fetcher = FixedFetcher(Ok(FetchOutcome::Found(b"# API".to_vec())));

        let outcome = render_document(&fetcher, &RefusingRenderer, &coordinates()).await;
        assert!(matches!(outcome, Err(RenderFailure::Render(_))));
    }
}
