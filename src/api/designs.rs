//! Custom design endpoints.

use axum::{extract::State, Json};

use super::{success, ApiResult};
use crate::auth::CurrentStudent;
use crate::errors::AppError;
use crate::models::{CustomDesign, GenerateDesignRequest};
use crate::AppState;

/// GET /api/me/designs - List the student's designs, oldest first.
pub async fn list_designs(current: CurrentStudent) -> ApiResult<Vec<CustomDesign>> {
    success(current.student.custom_designs)
}

/// POST /api/me/designs - Generate a design from a description and color mood.
pub async fn create_design(
    State(state): State<AppState>,
    current: CurrentStudent,
    Json(request): Json<GenerateDesignRequest>,
) -> ApiResult<CustomDesign> {
    if request.design_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Please provide a description for your certificate design.".to_string(),
        ));
    }

    let design = CustomDesign::generate(&request, chrono::Local::now());
    let design = state.repo.add_design(&current.student.id, design).await?;

    tracing::info!(
        "Design {} ({}) created for {}",
        design.display_name,
        design.name,
        current.student.name
    );
    success(design)
}
