//! Helpers shared by the services and the admin CLI.
//!
//! - [`slug_generator`] - Random slug generation
//! - [`request_hash`] - Request fingerprints for idempotency
//! - [`password`] - Argon2 password hashing

pub mod password;
pub mod request_hash;
pub mod slug_generator;
