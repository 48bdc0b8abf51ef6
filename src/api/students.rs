//! Student account endpoints: signup, sign in, profile and unit marks.

use axum::{extract::State, Json};
use indexmap::IndexMap;

use super::{success, ApiResult};
use crate::auth::{hash_password, verify_password, CurrentStudent};
use crate::errors::AppError;
use crate::models::{
    unit_marks_from_form, SigninRequest, SigninResponse, SignupRequest, StudentRecord,
};
use crate::AppState;

/// POST /api/signup - Register a student pending admin approval.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<StudentRecord> {
    // Validate required fields
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    if !state.verifier.verify(&request.school) {
        tracing::info!("Signup refused, school not verified: {:?}", request.school);
        return Err(AppError::Validation(
            "Unable to sign up. Please recheck your school information and try again.".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)?;
    let student = state.repo.create_student(&request, password_hash).await?;

    tracing::info!("New signup pending approval: {} ({})", student.name, student.id);
    success(student)
}

/// POST /api/signin - Exchange name and password for a session token.
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> ApiResult<SigninResponse> {
    let candidates = state.repo.find_students_by_name(request.name.trim()).await?;

    let student = candidates
        .into_iter()
        .find(|s| verify_password(&request.password, &s.password_hash))
        .ok_or_else(|| {
            AppError::Unauthorized("Invalid credentials or account not found.".to_string())
        })?;

    if !student.is_approved() {
        return Err(AppError::PendingApproval(
            "Your account is still pending approval.".to_string(),
        ));
    }

    let token = state.repo.create_session(&student.id).await?;
    tracing::info!("Student signed in: {}", student.name);

    success(SigninResponse { token, student })
}

/// POST /api/logout - End the current session.
pub async fn logout(State(state): State<AppState>, current: CurrentStudent) -> ApiResult<()> {
    state.repo.delete_session(&current.token).await?;
    success(())
}

/// GET /api/me - The signed-in student.
pub async fn me(current: CurrentStudent) -> ApiResult<StudentRecord> {
    success(current.student)
}

/// PUT /api/me/marks - Replace the student's unit marks.
pub async fn update_marks(
    State(state): State<AppState>,
    current: CurrentStudent,
    Json(form): Json<IndexMap<String, serde_json::Value>>,
) -> ApiResult<StudentRecord> {
    let unit_marks = unit_marks_from_form(form);
    let student = state
        .repo
        .update_unit_marks(&current.student.id, &unit_marks)
        .await?;

    tracing::debug!("Updated {} unit marks for {}", unit_marks.len(), student.name);
    success(student)
}
