use sqlx::SqlitePool;

use crate::db::models::EnrolledStudent;

pub(crate) async fn create(
    pool: &SqlitePool,
    course_id: &str,
    student_id: &str,
    enrolled_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO enrollments (course_id, student_id, enrolled_at) VALUES (?,?,?)")
        .bind(course_id)
        .bind(student_id)
        .bind(enrolled_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn exists(
    pool: &SqlitePool,
    course_id: &str,
    student_id: &str,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM enrollments WHERE course_id = ? AND student_id = ?",
    )
    .bind(course_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

pub(crate) async fn list_students(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Vec<EnrolledStudent>, sqlx::Error> {
    sqlx::query_as::<_, EnrolledStudent>(
        "SELECT u.id, u.username, u.email, e.enrolled_at
         FROM enrollments e
         JOIN users u ON u.id = e.student_id
         WHERE e.course_id = ?
         ORDER BY u.username",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

