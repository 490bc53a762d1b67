//! Document application layer: coordinates in, rendered artifact out.

pub mod invalidation;
pub mod pipeline;
pub mod renderer;

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::cache::{DEFAULT_REF, DocCache, DocKey, DocKind};
use crate::github::ContentFetcher;

use pipeline::{DocCoordinates, RenderFailure};
use renderer::BlueprintRenderer;

/// Fallbacks applied when a request omits coordinates.
#[derive(Debug, Clone)]
pub struct DocDefaults {
    /// Owner suggested on the index page when none is given.
    pub owner: Option<String>,
    /// Path of the blueprint inside a repository.
    pub docs_path: String,
}

/// Serves rendered documents, populating the cache exactly once per miss.
pub struct DocService {
    cache: Arc<DocCache>,
    fetcher: Arc<dyn ContentFetcher>,
    renderer: Arc<dyn BlueprintRenderer>,
    defaults: DocDefaults,
    cache_enabled: bool,
}

impl DocService {
    pub fn new(
        cache: Arc<DocCache>,
        fetcher: Arc<dyn ContentFetcher>,
        renderer: Arc<dyn BlueprintRenderer>,
        defaults: DocDefaults,
        cache_enabled: bool,
    ) -> Self {
        Self {
            cache,
            fetcher,
            renderer,
            defaults,
            cache_enabled,
        }
    }

    pub fn defaults(&self) -> &DocDefaults {
        &self.defaults
    }

    /// Return the rendered blueprint for `{owner}/{repository}` at the
    /// requested ref and path, falling back to `master` and the configured
    /// docs path.
    pub async fn rendered_doc(
        &self,
        owner: &str,
        repository: &str,
        git_ref: Option<&str>,
        docs_path: Option<&str>,
    ) -> Result<Bytes, RenderFailure> {
        let coordinates = DocCoordinates {
            owner_repo: format!("{owner}/{repository}"),
            git_ref: git_ref.unwrap_or(DEFAULT_REF).to_string(),
            docs_path: docs_path.unwrap_or(&self.defaults.docs_path).to_string(),
        };

        if !self.cache_enabled {
            debug!(owner_repo = %coordinates.owner_repo, "Cache disabled; rendering directly");
            return pipeline::render_document(
                self.fetcher.as_ref(),
                self.renderer.as_ref(),
                &coordinates,
            )
            .await;
        }

        let key = DocKey::new(
            coordinates.owner_repo.clone(),
            coordinates.git_ref.clone(),
            coordinates.docs_path.clone(),
            DocKind::Blueprint,
        );

        let fetcher = self.fetcher.clone();
        let renderer = self.renderer.clone();
        self.cache
            .get_or_render(&key, move || async move {
                pipeline::render_document(fetcher.as_ref(), renderer.as_ref(), &coordinates).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::github::{FetchError, FetchOutcome};

    use super::renderer::RendererError;
    use super::*;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentFetcher for CountingFetcher {
        async fn fetch_file(
            &self,
            _owner_repo: &str,
            _git_ref: &str,
            _path: &str,
        ) -> Result<FetchOutcome, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FetchOutcome::Found(b"# API".to_vec()))
        }
    }

    struct EchoRenderer;

    impl BlueprintRenderer for EchoRenderer {
        fn render(&self, source: &str) -> Result<String, RendererError> {
            Ok(format!("<main>{source}</main>"))
        }
    }

    fn service(cache_enabled: bool) -> (DocService, Arc<CountingFetcher>, Arc<DocCache>) {
        let cache = Arc::new(DocCache::new());
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
        });
        let service = DocService::new(
            cache.clone(),
            fetcher.clone(),
            Arc::new(EchoRenderer),
            DocDefaults {
                owner: None,
                docs_path: "apiary.apib".to_string(),
            },
            cache_enabled,
        );
        (service, fetcher, cache)
    }

    #[tokio::test]
    async fn repeat_requests_are_served_from_cache() {
        let (service, fetcher, _cache) = service(true);

        let first = service
            .rendered_doc("acme", "api", None, None)
            .await
            .expect("first render");
        let second = service
            .rendered_doc("acme", "api", None, None)
            .await
            .expect("second render");

        assert_eq!(first, second);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn omitted_ref_and_path_fall_back_to_defaults() {
        let (service, _fetcher, cache) = service(true);

        service
            .rendered_doc("acme", "api", None, None)
            .await
            .expect("render");

        let key = DocKey::new("acme/api", "master", "apiary.apib", DocKind::Blueprint);
        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn distinct_refs_populate_distinct_entries() {
        let (service, fetcher, cache) = service(true);

        service
            .rendered_doc("acme", "api", Some("master"), None)
            .await
            .expect("render master");
        service
            .rendered_doc("acme", "api", Some("develop"), None)
            .await
            .expect("render develop");

        assert_eq!(cache.len(), 2);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn disabled_cache_renders_every_request() {
        let (service, fetcher, cache) = service(false);

        service
            .rendered_doc("acme", "api", None, None)
            .await
            .expect("first render");
        service
            .rendered_doc("acme", "api", None, None)
            .await
            .expect("second render");

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
