//! Bearer token identity helpers
//!
//! Login and session handling live outside Setu. Services receive an opaque
//! bearer token per user and only ever store its SHA-256 hash.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the axum extractor lives in each
//! service.

use sha2::{Digest, Sha256};

/// Hash a bearer token for storage/lookup (lowercase hex SHA-256)
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

/// Extract the token from an `Authorization` header value
///
/// Accepts `Bearer <token>` (scheme is case-insensitive). Returns `None`
/// for any other shape or an empty token.
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
