//! Business logic services.
//!
//! Services contain core logic separated from HTTP handlers. They talk to the
//! record store and the QR artifact directory and return `AppError`.

pub mod analytics_service;
pub mod business_service;
pub mod qr_service;
pub mod scan_service;
