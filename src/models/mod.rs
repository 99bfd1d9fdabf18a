//! Data models for persisted collections and API payloads.

/// Analytics outputs and the day-bucket reduction
pub mod analytics;
/// Business records and registration requests
pub mod business;
/// Review text lookup and landing payload
pub mod review;
/// Scan events and typed timestamps
pub mod scan;
