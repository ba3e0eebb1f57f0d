use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_owner, CurrentStudent, CurrentTeacher, CurrentUser};
use crate::api::validation::validate_upload;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::Assignment;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::assignment::{
    AssignmentCreate, AssignmentListQuery, AssignmentResponse, SubmissionResponse,
};
use crate::services::storage::StoredFile;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assignments).post(create_assignment))
        .route("/:assignment_id/submissions", get(list_submissions).post(submit_assignment))
}

async fn create_assignment(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_owner(&state, &teacher, &payload.course_id).await?;

    let due_date = to_primitive_utc(payload.due_date);
    let now = primitive_now_utc();
    if due_date < now {
        return Err(ApiError::BadRequest("Due date cannot be in the past".to_string()));
    }

    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            course_id: &payload.course_id,
            title: payload.title.trim(),
            content: &payload.content,
            due_date,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

async fn list_assignments(
    Query(query): Query<AssignmentListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    match user.role {
        UserRole::Teacher => {
            require_course_owner(&state, &user, &query.course_id).await?;
        }
        UserRole::Student => {
            let enrolled =
                repositories::enrollments::exists(state.db(), &query.course_id, &user.id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
            if !enrolled {
                return Err(ApiError::Forbidden("Not enrolled in this course"));
            }
        }
        UserRole::Parent => {
            return Err(ApiError::Forbidden("Not enough permissions for this course"));
        }
    }

    let assignments = repositories::assignments::list_by_course(state.db(), &query.course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

async fn submit_assignment(
    Path(assignment_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;

    let enrolled = repositories::enrollments::exists(state.db(), &assignment.course_id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(ApiError::Forbidden("Not enrolled in this course"));
    }

    let form = read_submission_form(&state, multipart).await?;
    let content = form.content.ok_or_else(|| {
        ApiError::BadRequest("Submission content must not be empty".to_string())
    })?;
    if content.trim().is_empty() {
        return Err(ApiError::BadRequest("Submission content must not be empty".to_string()));
    }

    let stored: Option<StoredFile> = match form.file {
        Some((filename, bytes)) => {
            validate_upload(&filename, &state.settings().storage().allowed_upload_extensions)?;
            let stored = state
                .storage()
                .store(&filename, &bytes)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to store uploaded file"))?;
            Some(stored)
        }
        None => None,
    };

    let submission = repositories::submissions::create(
        state.db(),
        repositories::submissions::CreateSubmission {
            id: &Uuid::new_v4().to_string(),
            assignment_id: &assignment.id,
            student_id: &student.id,
            content: &content,
            file_name: stored.as_ref().map(|file| file.file_name.as_str()),
            file_path: stored.as_ref().map(|file| file.file_path.as_str()),
            file_size: stored.as_ref().map(|file| file.file_size),
            file_hash: stored.as_ref().map(|file| file.file_hash.as_str()),
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record submission"))?;

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission))))
}

async fn list_submissions(
    Path(assignment_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionResponse>>, ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;
    require_course_owner(&state, &teacher, &assignment.course_id).await?;

    let submissions = repositories::submissions::list_by_assignment(state.db(), &assignment.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(submissions.into_iter().map(SubmissionResponse::from_db).collect()))
}

struct SubmissionForm {
    content: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_submission_form(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm { content: None, file: None };
    let max_bytes = state.settings().storage().max_upload_size_mb * 1024 * 1024;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "content" {
            form.content = Some(
                field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid submission content".to_string()))?,
            );
        } else if name == "file" {
            let filename = field.file_name().map(|s| s.to_string()).filter(|s| !s.is_empty());
            let Some(filename) = filename else {
                // Browsers send an empty file part when nothing was chosen.
                continue;
            };

            let mut bytes = Vec::new();
            while let Some(chunk) = field
                .chunk()
                .await
                .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
            {
                let next_size = bytes.len() as u64 + chunk.len() as u64;
                if next_size > max_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "File size exceeds {}MB limit",
                        state.settings().storage().max_upload_size_mb
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }
            form.file = Some((filename, bytes));
        }
    }

    Ok(form)
}

async fn fetch_assignment(
    state: &AppState,
    assignment_id: &str,
) -> Result<Assignment, ApiError> {
    repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}
