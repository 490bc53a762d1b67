//! Cache key definitions.
//!
//! A `DocKey` addresses one rendered artifact by its full coordinates. Keys
//! are compared field-wise and case-sensitively; the `Display` form is the
//! canonical single-string rendering used in logs.

use std::fmt;

/// Ref assumed when a request or push notification does not name one.
pub const DEFAULT_REF: &str = "master";

/// Which derived document a cache entry holds.
///
/// A single push can move every kind for its ref at once, so invalidation
/// always covers the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    /// The rendered primary blueprint document.
    Blueprint,
    /// The swagger specification source served alongside the blueprint.
    SwaggerYaml,
    /// The swagger UI shell wrapping the specification.
    SwaggerUi,
}

impl DocKind {
    /// Every kind, in eviction order.
    pub const ALL: [DocKind; 3] = [DocKind::Blueprint, DocKind::SwaggerYaml, DocKind::SwaggerUi];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Blueprint => "blueprint",
            DocKind::SwaggerYaml => "swagger-yaml",
            DocKind::SwaggerUi => "swagger-ui",
        }
    }
}

/// Cache key for one rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub owner_repo: String,
    pub git_ref: String,
    pub docs_path: String,
    pub kind: DocKind,
}

impl DocKey {
    pub fn new(
        owner_repo: impl Into<String>,
        git_ref: impl Into<String>,
        docs_path: impl Into<String>,
        kind: DocKind,
    ) -> Self {
        Self {
            owner_repo: owner_repo.into(),
            git_ref: git_ref.into(),
            docs_path: docs_path.into(),
            kind,
        }
    }

    /// The full set of keys that must be evicted together when a ref moves:
    /// one per known kind.
    pub fn ref_family(owner_repo: &str, git_ref: &str, docs_path: &str) -> Vec<DocKey> {
        DocKind::ALL
            .iter()
            .map(|kind| DocKey::new(owner_repo, git_ref, docs_path, *kind))
            .collect()
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}?ref={}&docs_path={}&kind={}",
            self.owner_repo,
            self.git_ref,
            self.docs_path,
            self.kind.as_str()
        )
    }
}
