use sqlx::SqlitePool;

use crate::db::models::Course;

const COLUMNS: &str = "id, title, description, teacher_id, created_at, updated_at";

pub(crate) struct CreateCourse<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) teacher_id: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct UpdateCourse {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &SqlitePool,
    params: CreateCourse<'_>,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, title, description, teacher_id, created_at, updated_at
         ) VALUES (?,?,?,?,?,?)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.teacher_id)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = ?"))
        .bind(course_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(
    pool: &SqlitePool,
    course_id: &str,
) -> Result<Course, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = ?"))
        .bind(course_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn list_by_teacher(
    pool: &SqlitePool,
    teacher_id: &str,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE teacher_id = ? ORDER BY title"
    ))
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &SqlitePool,
    course_id: &str,
    params: UpdateCourse,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE courses SET
            title = COALESCE(?, title),
            description = COALESCE(?, description),
            updated_at = ?
         WHERE id = ?",
    )
    .bind(params.title)
    .bind(params.description)
    .bind(params.updated_at)
    .bind(course_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete(pool: &SqlitePool, course_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?").bind(course_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
