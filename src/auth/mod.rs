//! Authentication.
//!
//! Admin routes are guarded by a pre-shared key compared in constant time. Students
//! authenticate with a bearer session token issued at sign in.

mod password;

pub use password::{hash_password, verify_password};

use axum::{
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;
use crate::models::StudentRecord;
use crate::AppState;

/// Header name for the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-api-key";

/// Admin authentication layer function that takes the expected key as a parameter.
pub async fn admin_auth_layer(expected_key: Option<String>, request: Request, next: Next) -> Response {
    // If no key is configured, allow all requests (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| bearer_token(request.headers()));

    match provided {
        Some(key) if constant_time_compare(&key, &expected) => next.run(request).await,
        Some(_) => AppError::Unauthorized("Invalid admin key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing admin key".to_string()).into_response(),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The signed-in student, loaded fresh from the store on every request.
pub struct CurrentStudent {
    pub token: String,
    pub student: StudentRecord,
}

impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Please sign in first.".to_string()))?;

        let student = state
            .repo
            .student_for_session(&token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Session expired or invalid.".to_string()))?;

        if !student.is_approved() {
            return Err(AppError::PendingApproval(
                "Your account is still pending approval.".to_string(),
            ));
        }

        Ok(Self { token, student })
    }
}
