//! Chiaro Render Cache
//!
//! In-memory, ref-scoped cache of rendered documentation artifacts:
//!
//! - **Keys**: one entry per `(owner/repo, ref, docs path, kind)` tuple
//! - **Single-flight**: concurrent misses for a key collapse into one render
//! - **Invalidation**: explicit only — a push evicts every kind for its ref,
//!   a flush empties the cache; there is no TTL, since content pinned to a
//!   ref is immutable until the ref itself moves
//!
//! The cache is an injectable component owned by the application state, not
//! process-global, so tests can build and drop isolated instances.

mod keys;
mod lock;
mod store;

pub use keys::{DEFAULT_REF, DocKey, DocKind};
pub use store::{CachedDoc, DocCache};
