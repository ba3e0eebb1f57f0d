use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Progress;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressRecordRequest {
    #[validate(length(min = 1, message = "student_username must not be empty"))]
    pub(crate) student_username: String,
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 16, message = "grade must be 1-16 characters"))]
    pub(crate) grade: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "days_present must be non-negative"))]
    pub(crate) days_present: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "days_absent must be non-negative"))]
    pub(crate) days_absent: i64,
    #[serde(default)]
    pub(crate) overall_performance: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttendanceRequest {
    #[validate(length(min = 1, message = "student_username must not be empty"))]
    pub(crate) student_username: String,
    pub(crate) course_id: String,
    #[serde(default)]
    #[validate(range(min = 0, message = "days_present must be non-negative"))]
    pub(crate) days_present: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "days_absent must be non-negative"))]
    pub(crate) days_absent: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgressListQuery {
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) course_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) teacher_id: String,
    pub(crate) grade: Option<String>,
    pub(crate) days_present: i64,
    pub(crate) days_absent: i64,
    pub(crate) overall_performance: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ProgressResponse {
    pub(crate) fn from_db(progress: Progress) -> Self {
        Self {
            id: progress.id,
            student_id: progress.student_id,
            course_id: progress.course_id,
            teacher_id: progress.teacher_id,
            grade: progress.grade,
            days_present: progress.days_present,
            days_absent: progress.days_absent,
            overall_performance: progress.overall_performance,
            created_at: format_primitive(progress.created_at),
            updated_at: format_primitive(progress.updated_at),
        }
    }
}
