//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers.
//! They can:
//! - Attach caller identity to requests
//! - Short-circuit requests (reject unidentified callers)

/// Forwarded caller identity
pub mod identity;
