//! Render cache storage and single-flight coordination.
//!
//! `DocCache` owns the only shared mutable state in the process: the map of
//! rendered artifacts plus a registry of in-flight renders. All map mutation
//! goes through one `RwLock`, so an eviction can never be lost behind or
//! reordered with a concurrent store; a render finishing after an eviction
//! simply re-inserts and the next push evicts it again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, RwLock};

use bytes::Bytes;
use metrics::counter;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::debug;

use crate::docs::pipeline::RenderFailure;

use super::keys::DocKey;
use super::lock::{mutex_lock, rw_read, rw_write};

type FlightOutcome = Result<Bytes, RenderFailure>;
type FlightChannel = watch::Receiver<Option<FlightOutcome>>;

/// One successfully rendered artifact.
///
/// Entries are never edited in place; invalidation deletes and the next
/// miss inserts a fresh entry.
#[derive(Debug, Clone)]
pub struct CachedDoc {
    pub html: Bytes,
    pub stored_at: OffsetDateTime,
}

impl CachedDoc {
    pub fn new(html: Bytes) -> Self {
        Self {
            html,
            stored_at: OffsetDateTime::now_utc(),
        }
    }
}

/// In-memory render cache with a single-flight population protocol.
pub struct DocCache {
    entries: RwLock<HashMap<DocKey, CachedDoc>>,
    flights: Mutex<HashMap<DocKey, FlightChannel>>,
}

enum FlightRole {
    Leader(watch::Sender<Option<FlightOutcome>>),
    Follower(FlightChannel),
}

impl DocCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Pure lookup; no side effects.
    pub fn get(&self, key: &DocKey) -> Option<CachedDoc> {
        rw_read(&self.entries, "get").get(key).cloned()
    }

    /// Return the cached artifact for `key`, rendering it at most once when
    /// absent.
    ///
    /// Concurrent callers for the same missing key collapse onto a single
    /// execution of `render`: the first caller leads and runs the future
    /// with no cache locks held, later callers subscribe to the leader's
    /// outcome and receive the identical success or failure. Successes are
    /// stored before the flight is retired; failures are broadcast but
    /// never stored, so the next caller starts a fresh flight.
    pub async fn get_or_render<F, Fut>(&self, key: &DocKey, render: F) -> FlightOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FlightOutcome>,
    {
        if let Some(doc) = self.get(key) {
            counter!("chiaro_docs_cache_hit_total").increment(1);
            return Ok(doc.html);
        }
        counter!("chiaro_docs_cache_miss_total").increment(1);

        loop {
            let role = {
                let mut flights = mutex_lock(&self.flights, "get_or_render.enroll");
                match flights.get(key) {
                    Some(rx) => FlightRole::Follower(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        flights.insert(key.clone(), rx);
                        FlightRole::Leader(tx)
                    }
                }
            };

            match role {
                FlightRole::Leader(tx) => {
                    // A flight that settled between the lookup above and our
                    // enrollment may already have stored this key.
                    if let Some(doc) = self.get(key) {
                        mutex_lock(&self.flights, "get_or_render.settled").remove(key);
                        let _ = tx.send(Some(Ok(doc.html.clone())));
                        return Ok(doc.html);
                    }

                    let outcome = render().await;

                    match &outcome {
                        Ok(html) => {
                            self.insert(key.clone(), CachedDoc::new(html.clone()));
                        }
                        Err(failure) => {
                            counter!("chiaro_docs_render_failure_total").increment(1);
                            debug!(key = %key, failure = %failure, "Render failed; nothing cached");
                        }
                    }

                    mutex_lock(&self.flights, "get_or_render.finish").remove(key);
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome;
                }
                FlightRole::Follower(mut rx) => {
                    match rx.wait_for(|outcome| outcome.is_some()).await {
                        Ok(published) => {
                            if let Some(outcome) = published.as_ref() {
                                return outcome.clone();
                            }
                        }
                        Err(_) => {
                            // The leader vanished without publishing (its task
                            // panicked or was dropped). Retire the dead flight
                            // and race for leadership on the next turn.
                            let mut flights =
                                mutex_lock(&self.flights, "get_or_render.dead_flight");
                            if let Some(current) = flights.get(key)
                                && current.same_channel(&rx)
                            {
                                flights.remove(key);
                            }
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn insert(&self, key: DocKey, doc: CachedDoc) {
        rw_write(&self.entries, "insert").insert(key, doc);
    }

    /// Remove the entry for `key` if present; a no-op otherwise.
    pub fn delete(&self, key: &DocKey) {
        if rw_write(&self.entries, "delete").remove(key).is_some() {
            counter!("chiaro_docs_cache_evict_total").increment(1);
        }
    }

    /// Evict every kind cached under `(owner_repo, git_ref, docs_path)`.
    /// Keys with no entry are tolerated silently.
    pub fn delete_ref_family(&self, owner_repo: &str, git_ref: &str, docs_path: &str) {
        let mut entries = rw_write(&self.entries, "delete_ref_family");
        for key in DocKey::ref_family(owner_repo, git_ref, docs_path) {
            if entries.remove(&key).is_some() {
                counter!("chiaro_docs_cache_evict_total").increment(1);
            }
        }
    }

    /// Evict all entries unconditionally.
    pub fn clear(&self) {
        rw_write(&self.entries, "clear").clear();
        counter!("chiaro_docs_cache_flush_total").increment(1);
    }

    /// Number of cached artifacts.
    pub fn len(&self) -> usize {
        rw_read(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DocCache {
    fn default() -> Self {
        Self::new()
    }
}
