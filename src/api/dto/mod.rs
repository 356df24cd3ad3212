//! Data Transfer Objects for API requests and responses.
//!
//! Request bodies are deserialized with Serde; field validation happens in
//! the services so that every entry point enforces the same rules.

pub mod health;
pub mod short_url;
pub mod user;
