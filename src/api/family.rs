use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentParent;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::family::{ChildResponse, LinkStudentRequest};
use crate::schemas::progress::ProgressResponse;
use crate::schemas::user::UserResponse;
use crate::services::family::{self, LinkError};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/link", post(link_student)).route("/children", get(list_children))
}

async fn link_student(
    CurrentParent(parent): CurrentParent,
    State(state): State<AppState>,
    Json(payload): Json<LinkStudentRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let student = family::link_student(
        state.db(),
        &parent,
        &payload.student_username,
        &payload.student_email,
    )
    .await
    .map_err(|err| match err {
        LinkError::NotLinkable => {
            ApiError::Conflict("Student not found or already linked".to_string())
        }
        LinkError::Cycle => {
            ApiError::Conflict("Link would make the student its own ancestor".to_string())
        }
        LinkError::Db(e) => ApiError::internal(e, "Failed to link student"),
    })?;

    tracing::info!(
        parent_id = %parent.id,
        student_id = %student.id,
        action = "family_link",
        "Parent linked student"
    );

    Ok((StatusCode::CREATED, Json(UserResponse::from_db(student))))
}

async fn list_children(
    CurrentParent(parent): CurrentParent,
    State(state): State<AppState>,
) -> Result<Json<Vec<ChildResponse>>, ApiError> {
    let children = repositories::users::list_children(state.db(), &parent.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list children"))?;

    let mut response = Vec::with_capacity(children.len());
    for child in children {
        let progress = repositories::progress::list_by_student(state.db(), &child.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list child progress"))?;
        response.push(ChildResponse {
            child: UserResponse::from_db(child),
            progress: progress.into_iter().map(ProgressResponse::from_db).collect(),
        });
    }

    Ok(Json(response))
}
