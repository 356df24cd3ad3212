//! Request fingerprints stored next to idempotency tokens.
//!
//! A fingerprint is the lowercase hex SHA-256 of a canonical JSON document
//! describing the creation request. `serde_json` objects keep their keys
//! sorted, so equal requests always hash equal.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Fingerprint of a short URL creation request.
pub fn short_url_request_hash(destination_url: &str) -> String {
    fingerprint(&json!({
        "kind": "short_url",
        "destination_url": destination_url,
    }))
}

/// Fingerprint of a user creation request.
///
/// The password is not part of the fingerprint.
pub fn user_request_hash(username: &str, email: &str) -> String {
    fingerprint(&json!({
        "kind": "user",
        "username": username,
        "email": email,
    }))
}

fn fingerprint(document: &Value) -> String {
    hex::encode(Sha256::digest(document.to_string().as_bytes()))
}
