//! Admin endpoints: signup review and the student directory.

use axum::extract::{Path, State};

use super::{success, ApiResult};
use crate::mail::{approval_email, deliver, rejection_email, removal_email};
use crate::models::{
    AdminActionResult, Dashboard, Notification, StudentDirectory, StudentRecord,
};
use crate::AppState;

/// GET /api/admin/dashboard - Pending notifications and the approved-student count.
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let notifications = state.repo.list_notifications().await?;
    let total_students = state.repo.count_approved().await?;

    success(Dashboard {
        notifications,
        total_students,
    })
}

/// GET /api/admin/notifications - Pending notifications, oldest first.
pub async fn list_notifications(State(state): State<AppState>) -> ApiResult<Vec<Notification>> {
    success(state.repo.list_notifications().await?)
}

/// POST /api/admin/notifications/{id}/approve - Approve a pending signup.
pub async fn approve_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<AdminActionResult> {
    let student = state.repo.approve_notification(id).await?;
    tracing::info!("Approved student {} ({})", student.name, student.id);

    let email = approval_email(&student.name, &student.email, &state.config.public_url);
    let email_sent = deliver(state.mailer.as_ref(), email);

    success(AdminActionResult {
        student,
        email_sent,
    })
}

/// POST /api/admin/notifications/{id}/reject - Reject a pending signup and delete the student.
pub async fn reject_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<AdminActionResult> {
    let student = state.repo.reject_notification(id).await?;
    tracing::info!("Rejected student {} ({})", student.name, student.id);

    let email_sent = deliver(
        state.mailer.as_ref(),
        rejection_email(&student.name, &student.email),
    );

    success(AdminActionResult {
        student,
        email_sent,
    })
}

/// GET /api/admin/students - All students grouped by approval state.
pub async fn list_students(State(state): State<AppState>) -> ApiResult<StudentDirectory> {
    let (approved_students, pending_students): (Vec<StudentRecord>, Vec<StudentRecord>) = state
        .repo
        .list_students()
        .await?
        .into_iter()
        .partition(StudentRecord::is_approved);

    success(StudentDirectory {
        total_approved: approved_students.len(),
        total_pending: pending_students.len(),
        approved_students,
        pending_students,
    })
}

/// DELETE /api/admin/students/{name}/{roll_no} - Remove a student entirely.
pub async fn remove_student(
    State(state): State<AppState>,
    Path((name, roll_no)): Path<(String, String)>,
) -> ApiResult<AdminActionResult> {
    let student = state.repo.remove_student(&name, &roll_no).await?;
    tracing::info!("Removed student {} (roll number {})", student.name, student.roll_no);

    let email_sent = deliver(
        state.mailer.as_ref(),
        removal_email(&student.name, &student.email),
    );

    success(AdminActionResult {
        student,
        email_sent,
    })
}
