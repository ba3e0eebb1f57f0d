use sqlx::SqlitePool;

use crate::db::models::AssignmentSubmission;

const COLUMNS: &str = "\
    id, assignment_id, student_id, content, file_name, file_path, file_size, file_hash, \
    submitted_at";

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) assignment_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) content: &'a str,
    pub(crate) file_name: Option<&'a str>,
    pub(crate) file_path: Option<&'a str>,
    pub(crate) file_size: Option<i64>,
    pub(crate) file_hash: Option<&'a str>,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &SqlitePool,
    params: CreateSubmission<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (
            id, assignment_id, student_id, content, file_name, file_path, file_size,
            file_hash, submitted_at
         ) VALUES (?,?,?,?,?,?,?,?,?)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.assignment_id)
    .bind(params.student_id)
    .bind(params.content)
    .bind(params.file_name)
    .bind(params.file_path)
    .bind(params.file_size)
    .bind(params.file_hash)
    .bind(params.submitted_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_assignment(
    pool: &SqlitePool,
    assignment_id: &str,
) -> Result<Vec<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions WHERE assignment_id = ?
         ORDER BY submitted_at",
    ))
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}
