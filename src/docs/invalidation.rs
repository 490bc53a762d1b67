//! Push-driven cache invalidation.
//!
//! A push notification names a repository and, usually, a fully qualified
//! ref. The handler derives the short ref, then evicts every document kind
//! cached under it. Re-delivery of the same event is harmless: deleting an
//! absent key is a no-op.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::cache::{DEFAULT_REF, DocCache};

/// The subset of a push delivery this service consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEvent {
    pub repository: PushRepository,
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PushRepository {
    pub full_name: String,
}

/// Derive the short ref from a raw `refs/<kind>/<name>` value.
///
/// Only an exactly three-segment ref is decomposed; anything else,
/// including an absent ref, falls back to the default.
pub fn derived_ref(raw_ref: Option<&str>) -> &str {
    let Some(raw) = raw_ref else {
        return DEFAULT_REF;
    };

    let mut segments = raw.split('/');
    match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(_), Some(_), Some(short), None) => short,
        _ => DEFAULT_REF,
    }
}

/// Applies push notifications and flush requests to the render cache.
pub struct InvalidationService {
    cache: Arc<DocCache>,
    default_docs_path: String,
}

impl InvalidationService {
    pub fn new(cache: Arc<DocCache>, default_docs_path: String) -> Self {
        Self {
            cache,
            default_docs_path,
        }
    }

    /// Evict every kind cached for the pushed ref.
    pub fn handle_push(&self, event: &PushEvent) {
        let git_ref = derived_ref(event.git_ref.as_deref());
        info!(
            owner_repo = %event.repository.full_name,
            git_ref,
            raw_ref = event.git_ref.as_deref().unwrap_or(""),
            "Evicting cached documents for pushed ref"
        );
        self.cache
            .delete_ref_family(&event.repository.full_name, git_ref, &self.default_docs_path);
    }

    /// Evict everything, for the administrative flush request.
    pub fn handle_flush_all(&self) {
        info!("Flushing the entire document cache");
        self.cache.clear();
    }
}
