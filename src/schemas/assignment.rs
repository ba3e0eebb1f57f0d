use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Assignment, AssignmentSubmission};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    pub(crate) course_id: String,
    #[validate(length(min = 1, max = 200, message = "title must not be empty"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub(crate) content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) due_date: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentListQuery {
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) due_date: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            course_id: assignment.course_id,
            title: assignment.title,
            content: assignment.content,
            due_date: format_primitive(assignment.due_date),
            created_at: format_primitive(assignment.created_at),
            updated_at: format_primitive(assignment.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) content: String,
    pub(crate) file_name: Option<String>,
    pub(crate) file_size: Option<i64>,
    pub(crate) file_hash: Option<String>,
    pub(crate) submitted_at: String,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: AssignmentSubmission) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            content: submission.content,
            file_name: submission.file_name,
            file_size: submission.file_size,
            file_hash: submission.file_hash,
            submitted_at: format_primitive(submission.submitted_at),
        }
    }
}
