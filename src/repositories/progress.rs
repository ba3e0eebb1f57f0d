use sqlx::SqlitePool;

use crate::db::models::Progress;

const COLUMNS: &str = "\
    id, student_id, course_id, teacher_id, grade, days_present, days_absent, \
    overall_performance, created_at, updated_at";

pub(crate) struct CreateProgress<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) grade: Option<&'a str>,
    pub(crate) days_present: i64,
    pub(crate) days_absent: i64,
    pub(crate) overall_performance: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &SqlitePool,
    params: CreateProgress<'_>,
) -> Result<Progress, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "INSERT INTO progress (
            id, student_id, course_id, teacher_id, grade, days_present, days_absent,
            overall_performance, created_at, updated_at
         ) VALUES (?,?,?,?,?,?,?,?,?,?)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.course_id)
    .bind(params.teacher_id)
    .bind(params.grade)
    .bind(params.days_present)
    .bind(params.days_absent)
    .bind(params.overall_performance)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_student_course(
    pool: &SqlitePool,
    student_id: &str,
    course_id: &str,
) -> Result<Option<Progress>, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "SELECT {COLUMNS} FROM progress WHERE student_id = ? AND course_id = ?"
    ))
    .bind(student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct RecordProgress<'a> {
    pub(crate) teacher_id: &'a str,
    pub(crate) grade: Option<&'a str>,
    pub(crate) days_present: i64,
    pub(crate) days_absent: i64,
    pub(crate) overall_performance: Option<&'a str>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Grade and notes overwrite; attendance counters accumulate.
pub(crate) async fn record(
    pool: &SqlitePool,
    student_id: &str,
    course_id: &str,
    params: RecordProgress<'_>,
) -> Result<Progress, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "UPDATE progress SET
            teacher_id = ?,
            grade = COALESCE(?, grade),
            days_present = days_present + ?,
            days_absent = days_absent + ?,
            overall_performance = COALESCE(?, overall_performance),
            updated_at = ?
         WHERE student_id = ? AND course_id = ?
         RETURNING {COLUMNS}",
    ))
    .bind(params.teacher_id)
    .bind(params.grade)
    .bind(params.days_present)
    .bind(params.days_absent)
    .bind(params.overall_performance)
    .bind(params.updated_at)
    .bind(student_id)
    .bind(course_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_student(
    pool: &SqlitePool,
    student_id: &str,
) -> Result<Vec<Progress>, sqlx::Error> {
    sqlx::query_as::<_, Progress>(&format!(
        "SELECT {COLUMNS} FROM progress WHERE student_id = ? ORDER BY course_id"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}
