use sqlx::SqlitePool;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "\
    id, username, email, hashed_password, role, parent_id, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = ?"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Login lookup: the identifier may be a username or an email address.
pub(crate) async fn find_by_identifier(
    pool: &SqlitePool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE username = ?1 OR email = ?1"
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_by_username_or_email(
    pool: &SqlitePool,
    username: &str,
    email: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE username = ? OR email = ?")
        .bind(username)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_all(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY username"))
        .fetch_all(pool)
        .await
}

pub(crate) async fn list_children(
    pool: &SqlitePool,
    parent_id: &str,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE parent_id = ? ORDER BY username"
    ))
    .bind(parent_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_parent_id(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<Option<String>>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>("SELECT parent_id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Claims an unlinked student for a parent. Returns false when the student
/// already has a parent; the conditional write keeps two racing parents from
/// both succeeding.
pub(crate) async fn claim_parent(
    pool: &SqlitePool,
    student_id: &str,
    parent_id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET parent_id = ?, updated_at = ?
         WHERE id = ? AND parent_id IS NULL",
    )
    .bind(parent_id)
    .bind(updated_at)
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) email: &'a str,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &SqlitePool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, username, email, hashed_password, role, parent_id, created_at, updated_at
        ) VALUES (?,?,?,?,?,NULL,?,?)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.email)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateUser {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) role: Option<UserRole>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &SqlitePool,
    id: &str,
    params: UpdateUser,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            username = COALESCE(?, username),
            email = COALESCE(?, email),
            role = COALESCE(?, role),
            hashed_password = COALESCE(?, hashed_password),
            updated_at = ?
         WHERE id = ?",
    )
    .bind(params.username)
    .bind(params.email)
    .bind(params.role)
    .bind(params.hashed_password)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn fetch_one_by_id(pool: &SqlitePool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_one(pool)
        .await
}
