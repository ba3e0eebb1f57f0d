use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{config::Settings, security, state::AppState, time::primitive_now_utc};
use crate::db::models::{Assignment, Course, Progress, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::storage::StorageService;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

fn env_mutex() -> Arc<Mutex<()>> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone()
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    env_mutex().lock_owned().await
}

/// For synchronous tests that read or mutate process environment.
pub(crate) fn env_lock_blocking() -> OwnedMutexGuard<()> {
    env_mutex().blocking_lock_owned()
}

pub(crate) fn set_test_env() {
    std::env::set_var("SODLAT_ENV", "test");
    std::env::set_var("SODLAT_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("DATABASE_URL", "sqlite::memory:");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("ALLOWED_UPLOAD_EXTENSIONS");
    std::env::set_var(
        "UPLOAD_DIR",
        std::env::temp_dir().join("sodlat_edu_test_uploads").display().to_string(),
    );
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let db = crate::db::init_pool(&settings).await.expect("db pool");
    crate::db::run_migrations(&db).await.expect("migrations");

    let storage = StorageService::from_settings(&settings).expect("storage service");

    let state = AppState::new(settings, db, storage);
    let app = api::router::router(state.clone());

    TestContext { state, app, _guard: guard }
}

/// Bare migrated pool for service- and repository-level tests.
pub(crate) async fn test_pool() -> SqlitePool {
    let options =
        SqliteConnectOptions::from_str("sqlite::memory:").expect("options").foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("test pool");
    crate::db::run_migrations(&pool).await.expect("migrations");
    pool
}

pub(crate) async fn insert_user(
    pool: &SqlitePool,
    username: &str,
    email: &str,
    role: UserRole,
    password: &str,
) -> User {
    let hashed_password = security::hash_password(password).expect("hash password");
    let now = primitive_now_utc();

    repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            email,
            hashed_password,
            role,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert user")
}

pub(crate) async fn insert_course(pool: &SqlitePool, title: &str, teacher_id: &str) -> Course {
    let now = primitive_now_utc();
    repositories::courses::create(
        pool,
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            title,
            description: None,
            teacher_id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert course")
}

pub(crate) async fn enroll_student(pool: &SqlitePool, course_id: &str, student_id: &str) {
    repositories::enrollments::create(pool, course_id, student_id, primitive_now_utc())
        .await
        .expect("enroll student");
}

pub(crate) async fn insert_assignment(
    pool: &SqlitePool,
    course_id: &str,
    title: &str,
) -> Assignment {
    let now = primitive_now_utc();
    repositories::assignments::create(
        pool,
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            course_id,
            title,
            content: "Read the chapter and answer the questions.",
            due_date: now + time::Duration::days(7),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert assignment")
}

pub(crate) async fn insert_progress(
    pool: &SqlitePool,
    student_id: &str,
    course_id: &str,
    teacher_id: &str,
    grade: &str,
) -> Progress {
    let now = primitive_now_utc();
    repositories::progress::create(
        pool,
        repositories::progress::CreateProgress {
            id: &Uuid::new_v4().to_string(),
            student_id,
            course_id,
            teacher_id,
            grade: Some(grade),
            days_present: 0,
            days_absent: 0,
            overall_performance: None,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert progress")
}

/// Teacher + course + assignment in one call; used by submission tests.
pub(crate) async fn seed_course_with_assignment(
    ctx: &TestContext,
) -> (User, Course, Assignment) {
    let teacher = insert_user(
        ctx.state.db(),
        "mr-okafor",
        "okafor@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let course = insert_course(ctx.state.db(), "Mathematics", &teacher.id).await;
    let assignment = insert_assignment(ctx.state.db(), &course.id, "Homework 1").await;
    (teacher, course, assignment)
}

pub(crate) fn bearer_token(user_id: &str, settings: &Settings) -> String {
    security::create_access_token(user_id, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

/// Builds a multipart/form-data POST; each part is (name, filename, bytes).
pub(crate) fn multipart_request(
    uri: &str,
    token: Option<&str>,
    parts: &[(&str, Option<&str>, &[u8])],
) -> Request<Body> {
    const BOUNDARY: &str = "sodlat-test-boundary";

    let mut body = Vec::new();
    for (name, filename, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder.body(Body::from(body)).expect("request body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
