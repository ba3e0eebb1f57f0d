use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_course_owner, CurrentTeacher, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::progress::{
    AttendanceRequest, ProgressListQuery, ProgressRecordRequest, ProgressResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_progress).post(record_progress))
        .route("/attendance", post(record_attendance))
}

async fn record_progress(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<ProgressRecordRequest>,
) -> Result<(StatusCode, Json<ProgressResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_owner(&state, &teacher, &payload.course_id).await?;

    let student = fetch_enrolled_student(
        &state,
        &payload.student_username,
        &payload.course_id,
    )
    .await?;

    let existing = repositories::progress::find_by_student_course(
        state.db(),
        &student.id,
        &payload.course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch progress"))?;

    let now = primitive_now_utc();
    let (status, progress) = match existing {
        Some(_) => {
            let updated = repositories::progress::record(
                state.db(),
                &student.id,
                &payload.course_id,
                repositories::progress::RecordProgress {
                    teacher_id: &teacher.id,
                    grade: Some(&payload.grade),
                    days_present: payload.days_present,
                    days_absent: payload.days_absent,
                    overall_performance: payload.overall_performance.as_deref(),
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update progress"))?;
            (StatusCode::OK, updated)
        }
        None => {
            let created = repositories::progress::create(
                state.db(),
                repositories::progress::CreateProgress {
                    id: &Uuid::new_v4().to_string(),
                    student_id: &student.id,
                    course_id: &payload.course_id,
                    teacher_id: &teacher.id,
                    grade: Some(&payload.grade),
                    days_present: payload.days_present,
                    days_absent: payload.days_absent,
                    overall_performance: payload.overall_performance.as_deref(),
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to record progress"))?;
            (StatusCode::CREATED, created)
        }
    };

    Ok((status, Json(ProgressResponse::from_db(progress))))
}

async fn record_attendance(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<(StatusCode, Json<ProgressResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_owner(&state, &teacher, &payload.course_id).await?;

    let student = fetch_enrolled_student(
        &state,
        &payload.student_username,
        &payload.course_id,
    )
    .await?;

    let existing = repositories::progress::find_by_student_course(
        state.db(),
        &student.id,
        &payload.course_id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch progress"))?;

    let now = primitive_now_utc();
    let (status, progress) = match existing {
        Some(_) => {
            let updated = repositories::progress::record(
                state.db(),
                &student.id,
                &payload.course_id,
                repositories::progress::RecordProgress {
                    teacher_id: &teacher.id,
                    grade: None,
                    days_present: payload.days_present,
                    days_absent: payload.days_absent,
                    overall_performance: None,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update attendance"))?;
            (StatusCode::OK, updated)
        }
        None => {
            let created = repositories::progress::create(
                state.db(),
                repositories::progress::CreateProgress {
                    id: &Uuid::new_v4().to_string(),
                    student_id: &student.id,
                    course_id: &payload.course_id,
                    teacher_id: &teacher.id,
                    grade: None,
                    days_present: payload.days_present,
                    days_absent: payload.days_absent,
                    overall_performance: None,
                    created_at: now,
                    updated_at: now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to record attendance"))?;
            (StatusCode::CREATED, created)
        }
    };

    Ok((status, Json(ProgressResponse::from_db(progress))))
}

async fn list_progress(
    Query(query): Query<ProgressListQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProgressResponse>>, ApiError> {
    authorize_progress_read(&state, &user, &query).await?;

    let mut records = repositories::progress::list_by_student(state.db(), &query.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list progress"))?;

    if let Some(course_id) = &query.course_id {
        records.retain(|record| &record.course_id == course_id);
    }

    Ok(Json(records.into_iter().map(ProgressResponse::from_db).collect()))
}

/// A student may read their own records, a parent those of a linked child,
/// and a teacher those of a course they own.
async fn authorize_progress_read(
    state: &AppState,
    user: &User,
    query: &ProgressListQuery,
) -> Result<(), ApiError> {
    match user.role {
        UserRole::Student if user.id == query.student_id => Ok(()),
        UserRole::Parent => {
            let student = repositories::users::find_by_id(state.db(), &query.student_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to load student"))?;
            match student {
                Some(student) if student.parent_id.as_deref() == Some(user.id.as_str()) => Ok(()),
                _ => Err(ApiError::Forbidden("Not linked to this student")),
            }
        }
        UserRole::Teacher => {
            let Some(course_id) = &query.course_id else {
                return Err(ApiError::Forbidden("Teachers must scope progress to a course"));
            };
            require_course_owner(state, user, course_id).await?;
            Ok(())
        }
        _ => Err(ApiError::Forbidden("Not enough permissions for these records")),
    }
}

async fn fetch_enrolled_student(
    state: &AppState,
    username: &str,
    course_id: &str,
) -> Result<User, ApiError> {
    let student = repositories::users::find_by_username(state.db(), username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .filter(|user| user.role == UserRole::Student)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let enrolled = repositories::enrollments::exists(state.db(), course_id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check enrollment"))?;
    if !enrolled {
        return Err(ApiError::BadRequest("Student is not enrolled in this course".to_string()));
    }

    Ok(student)
}
