//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, caller context)
//! 2. Delegates to a service
//! 3. Returns HTTP response (JSON, status code)

/// Scan counters, chart series and dashboards
pub mod analytics;
/// Business registration, listing, deletion and QR download
pub mod businesses;
/// Service health
pub mod health;
/// Public QR landing page and review redirect
pub mod landing;
