//! Caller identity middleware.
//!
//! Authentication happens upstream. The authenticating proxy forwards who the
//! caller is in two headers; this middleware turns them into an explicit
//! [`CallerContext`] that protected handlers pass into every ownership-aware
//! service call.
//!
//! ```text
//! X-Owner-Email: owner@example.com
//! X-Owner-Role: owner | admin      (optional, defaults to owner)
//! ```

use axum::{extract::Request, middleware::Next, response::Response};

use crate::{error::AppError, models::business::Business};

pub const OWNER_EMAIL_HEADER: &str = "x-owner-email";
pub const OWNER_ROLE_HEADER: &str = "x-owner-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Sees and manages only businesses registered under its email
    Owner,
    /// Sees and manages every business
    Admin,
}

impl Role {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(Role::Owner),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated identity attached to protected requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<CallerContext>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub email: String,
    pub role: Role,
}

impl CallerContext {
    #[cfg(test)]
    pub fn owner(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: Role::Owner,
        }
    }

    #[cfg(test)]
    pub fn admin(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this caller may view, delete or inspect `business`.
    pub fn can_manage(&self, business: &Business) -> bool {
        self.is_admin() || business.owner_email == self.email
    }
}

/// Identity middleware function.
///
/// # Flow
///
/// 1. Read `X-Owner-Email`; missing or blank → 401
/// 2. Read optional `X-Owner-Role`; unknown value → 401
/// 3. Insert `CallerContext` into request extensions and call the next handler
pub async fn identity_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let headers = request.headers();

    let email = headers
        .get(OWNER_EMAIL_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or(AppError::Unauthenticated)?
        .to_string();

    let role = match headers.get(OWNER_ROLE_HEADER) {
        None => Role::Owner,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(Role::parse)
            .ok_or(AppError::Unauthenticated)?,
    };

    request.extensions_mut().insert(CallerContext { email, role });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::BusinessId;

    fn business_owned_by(email: &str) -> Business {
        Business {
            id: BusinessId::from("b1"),
            name: "Cafe".to_string(),
            category: "general".to_string(),
            owner_email: email.to_string(),
            external_review_url: "https://example.com".to_string(),
            status: "active".to_string(),
        }
    }

    #[test]
    fn owners_manage_only_their_own() {
        let caller = CallerContext::owner("a@example.com");
        assert!(caller.can_manage(&business_owned_by("a@example.com")));
        assert!(!caller.can_manage(&business_owned_by("b@example.com")));
    }

    #[test]
    fn admins_manage_everything() {
        let caller = CallerContext::admin("root@example.com");
        assert!(caller.can_manage(&business_owned_by("b@example.com")));
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(Role::parse(" Admin "), Some(Role::Admin));
        assert_eq!(Role::parse("owner"), Some(Role::Owner));
        assert_eq!(Role::parse("root"), None);
    }
}
