//! chiaro: an organization-gated documentation server.
//!
//! Renders API blueprint documents straight from version-controlled
//! repositories and keeps a ref-scoped render cache that push webhooks
//! invalidate. See `DESIGN.md` for the component map.

pub mod auth;
pub mod cache;
pub mod config;
pub mod docs;
pub mod error;
pub mod github;
pub mod http;
pub mod telemetry;
