use std::collections::HashSet;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum LinkError {
    /// Deliberately covers unknown username, email mismatch, non-student
    /// role and already-linked alike, so the caller leaks nothing about
    /// which accounts exist.
    #[error("student not found or already linked")]
    NotLinkable,
    #[error("link would make the student its own ancestor")]
    Cycle,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Links a student to `parent`. The student is located by username and must
/// also match on email; the claim itself is a conditional write, so of two
/// racing parents exactly one wins.
pub(crate) async fn link_student(
    pool: &SqlitePool,
    parent: &User,
    student_username: &str,
    student_email: &str,
) -> Result<User, LinkError> {
    let Some(student) = repositories::users::find_by_username(pool, student_username).await? else {
        return Err(LinkError::NotLinkable);
    };

    if student.role != UserRole::Student
        || student.email != student_email
        || student.parent_id.is_some()
    {
        return Err(LinkError::NotLinkable);
    }

    if would_create_cycle(pool, &student.id, &parent.id).await? {
        return Err(LinkError::Cycle);
    }

    let claimed =
        repositories::users::claim_parent(pool, &student.id, &parent.id, primitive_now_utc())
            .await?;
    if !claimed {
        return Err(LinkError::NotLinkable);
    }

    Ok(repositories::users::fetch_one_by_id(pool, &student.id).await?)
}

/// Walks the prospective parent's ancestor chain; the link is refused if the
/// student already appears in it.
async fn would_create_cycle(
    pool: &SqlitePool,
    student_id: &str,
    parent_id: &str,
) -> Result<bool, sqlx::Error> {
    let mut seen = HashSet::new();
    let mut current = Some(parent_id.to_string());

    while let Some(id) = current {
        if id == student_id {
            return Ok(true);
        }
        if !seen.insert(id.clone()) {
            // Pre-existing cycle in the data; refuse rather than loop.
            return Ok(true);
        }
        current = repositories::users::find_parent_id(pool, &id).await?.flatten();
    }

    Ok(false)
}
