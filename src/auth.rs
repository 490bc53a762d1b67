//! Viewer authentication gate.
//!
//! The login flow itself lives outside this service; what remains here is a
//! capability check: a presented bearer token either maps to an authenticated
//! viewer or the request is rejected. Tokens are compared by SHA-256 digest
//! in constant time. An empty token set disables the gate, for open
//! deployments behind some other perimeter.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing viewer token")]
    Missing,
    #[error("invalid viewer token")]
    Invalid,
}

/// An authenticated caller of the documentation surface.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Short digest prefix identifying which token matched, for logs.
    pub token_fingerprint: String,
}

pub struct ViewerAuth {
    token_digests: Vec<[u8; 32]>,
}

impl ViewerAuth {
    pub fn new(viewer_tokens: &[String]) -> Self {
        Self {
            token_digests: viewer_tokens
                .iter()
                .map(|token| hash_token(token))
                .collect(),
        }
    }

    /// True when no tokens are configured and the gate admits everyone.
    pub fn is_open(&self) -> bool {
        self.token_digests.is_empty()
    }

    pub fn authenticate(&self, token: Option<&str>) -> Result<Viewer, AuthError> {
        if self.is_open() {
            return Ok(Viewer {
                token_fingerprint: "open".to_string(),
            });
        }

        let token = token.ok_or(AuthError::Missing)?;
        let candidate = hash_token(token);

        for digest in &self.token_digests {
            if digest.as_slice().ct_eq(candidate.as_slice()).unwrap_u8() == 1 {
                return Ok(Viewer {
                    token_fingerprint: fingerprint(digest),
                });
            }
        }

        Err(AuthError::Invalid)
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().into()
}

fn fingerprint(digest: &[u8; 32]) -> String {
    digest
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> ViewerAuth {
        ViewerAuth::new(&["first-token".to_string(), "second-token".to_string()])
    }

    #[test]
    fn empty_token_set_admits_everyone() {
        let auth = ViewerAuth::new(&[]);
        assert!(auth.is_open());
        assert!(auth.authenticate(None).is_ok());
        assert!(auth.authenticate(Some("anything")).is_ok());
    }

    #[test]
    fn any_configured_token_authenticates() {
        let auth = gate();
        assert!(auth.authenticate(Some("first-token")).is_ok());
        assert!(auth.authenticate(Some("second-token")).is_ok());
    }

    #[test]
    fn missing_and_unknown_tokens_are_rejected() {
        let auth = gate();
        assert!(matches!(auth.authenticate(None), Err(AuthError::Missing)));
        assert!(matches!(
            auth.authenticate(Some("forged")),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn fingerprints_identify_the_matched_token() {
        let auth = gate();
        let first = auth.authenticate(Some("first-token")).expect("first ok");
        let second = auth.authenticate(Some("second-token")).expect("second ok");
        assert_ne!(first.token_fingerprint, second.token_fingerprint);
        assert_eq!(first.token_fingerprint.len(), 8);
    }
}
