use axum::{extract::State, routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::assignment::AssignmentResponse;
use crate::schemas::course::CourseResponse;
use crate::schemas::dashboard::DashboardResponse;
use crate::schemas::family::ChildResponse;
use crate::schemas::progress::ProgressResponse;
use crate::schemas::user::UserResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

async fn dashboard(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let response = match user.role {
        UserRole::Teacher => {
            let courses = repositories::courses::list_by_teacher(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
            DashboardResponse::Teacher {
                courses: courses.into_iter().map(CourseResponse::from_db).collect(),
            }
        }
        UserRole::Student => {
            let assignments = repositories::assignments::list_for_student(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;
            let progress = repositories::progress::list_by_student(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list progress"))?;
            DashboardResponse::Student {
                assignments: assignments.into_iter().map(AssignmentResponse::from_db).collect(),
                progress: progress.into_iter().map(ProgressResponse::from_db).collect(),
            }
        }
        UserRole::Parent => {
            let children = repositories::users::list_children(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to list children"))?;
            let mut summaries = Vec::with_capacity(children.len());
            for child in children {
                let progress = repositories::progress::list_by_student(state.db(), &child.id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to list child progress"))?;
                summaries.push(ChildResponse {
                    child: UserResponse::from_db(child),
                    progress: progress.into_iter().map(ProgressResponse::from_db).collect(),
                });
            }
            DashboardResponse::Parent { children: summaries }
        }
    };

    Ok(Json(response))
}
