use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::{is_unique_violation, ApiError};
use crate::api::guards::{require_course_owner, CurrentTeacher};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::course::{
    CourseCreate, CourseResponse, CourseUpdate, EnrollRequest, EnrolledStudentResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", axum::routing::patch(update_course).delete(delete_course))
        .route("/:course_id/students", get(list_students).post(enroll_student))
}

async fn create_course(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title: payload.title.trim(),
            description: payload.description.as_deref(),
            teacher_id: &teacher.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    Ok((StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn list_courses(
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list_by_teacher(state.db(), &teacher.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    require_course_owner(&state, &teacher, &course_id).await?;

    repositories::courses::update(
        state.db(),
        &course_id,
        repositories::courses::UpdateCourse {
            title: payload.title,
            description: payload.description,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    let updated = repositories::courses::fetch_one_by_id(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated course"))?;

    Ok(Json(CourseResponse::from_db(updated)))
}

async fn delete_course(
    Path(course_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    require_course_owner(&state, &teacher, &course_id).await?;

    let deleted = repositories::courses::delete(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;

    if !deleted {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    tracing::info!(
        teacher_id = %teacher.id,
        course_id = %course_id,
        action = "course_delete",
        "Teacher deleted course"
    );

    Ok(StatusCode::NO_CONTENT)
}

async fn enroll_student(
    Path(course_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrolledStudentResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    require_course_owner(&state, &teacher, &course_id).await?;

    let student = repositories::users::find_by_username(state.db(), &payload.username)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .filter(|user| user.role == UserRole::Student)
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    let enrolled_at = primitive_now_utc();
    repositories::enrollments::create(state.db(), &course_id, &student.id, enrolled_at)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Student is already enrolled in this course".to_string())
            } else {
                ApiError::internal(e, "Failed to enroll student")
            }
        })?;

    let response = EnrolledStudentResponse {
        id: student.id,
        username: student.username,
        email: student.email,
        enrolled_at: format_primitive(enrolled_at),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_students(
    Path(course_id): Path<String>,
    CurrentTeacher(teacher): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrolledStudentResponse>>, ApiError> {
    require_course_owner(&state, &teacher, &course_id).await?;

    let students = repositories::enrollments::list_students(state.db(), &course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrolled students"))?;

    Ok(Json(students.into_iter().map(EnrolledStudentResponse::from_db).collect()))
}

#[cfg(test)]
mod tests;
