use sqlx::SqlitePool;

use crate::db::models::Assignment;

const COLUMNS: &str = "id, course_id, title, content, due_date, created_at, updated_at";

pub(crate) struct CreateAssignment<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) content: &'a str,
    pub(crate) due_date: time::PrimitiveDateTime,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &SqlitePool,
    params: CreateAssignment<'_>,
) -> Result<Assignment, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "INSERT INTO assignments (
            id, course_id, title, content, due_date, created_at, updated_at
         ) VALUES (?,?,?,?,?,?,?)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.content)
    .bind(params.due_date)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &SqlitePool,
    assignment_id: &str,
) -> Result<Option<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = ?"))
        .bind(assignment_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_by_course(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(&format!(
        "SELECT {COLUMNS} FROM assignments WHERE course_id = ? ORDER BY due_date"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

/// Assignments visible to a student through their enrollments.
pub(crate) async fn list_for_student(
    pool: &SqlitePool,
    student_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        "SELECT a.id, a.course_id, a.title, a.content, a.due_date, a.created_at, a.updated_at
         FROM assignments a
         JOIN enrollments e ON e.course_id = a.course_id
         WHERE e.student_id = ?
         ORDER BY a.due_date",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
