//! HTTP middleware for request processing and protection.
//!
//! Provides the registration gate, rate limiting, request ids, panic recovery
//! and request tracing.

pub mod rate_limit;
pub mod recover;
pub mod registration;
pub mod request_id;
pub mod tracing;
