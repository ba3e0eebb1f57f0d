use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::{is_unique_violation, ApiError};
use crate::api::guards::CurrentUser;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::auth::TokenResponse;
use crate::schemas::user::{LoginRequest, RegisterRequest, UserResponse};

const INVALID_CREDENTIALS: &str = "Invalid username/email or password";

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let existing = repositories::users::exists_by_username_or_email(
        state.db(),
        &payload.username,
        &payload.email,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if existing.is_some() {
        return Err(ApiError::Conflict("Username or email is already registered".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username: &payload.username,
            email: &payload.email,
            hashed_password,
            role: payload.role,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| {
        // The pre-insert check is not atomic; the UNIQUE constraints catch
        // the race.
        if is_unique_violation(&e) {
            ApiError::Conflict("Username or email is already registered".to_string())
        } else {
            ApiError::internal(e, "Failed to create user")
        }
    })?;

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let response = TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user =
        repositories::users::find_by_identifier(state.db(), &payload.username_or_email)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?
            .ok_or(ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized(INVALID_CREDENTIALS))?;

    if !verified {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS));
    }

    let token = security::create_access_token(&user.id, state.settings(), None)
        .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user),
    }))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(user))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn register_then_login_with_username_or_email() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": "amara",
                    "email": "amara@example.com",
                    "password": "amara-secret",
                    "role": "student"
                })),
            ))
            .await
            .expect("register");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
        assert_eq!(body["user"]["username"], "amara");
        assert_eq!(body["user"]["role"], "student");
        assert!(body["access_token"].as_str().is_some_and(|token| !token.is_empty()));

        for identifier in ["amara", "amara@example.com"] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({
                        "username_or_email": identifier,
                        "password": "amara-secret"
                    })),
                ))
                .await
                .expect("login");
            assert_eq!(response.status(), StatusCode::OK, "identifier: {identifier}");
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let ctx = test_support::setup_test_context().await;

        test_support::insert_user(
            ctx.state.db(),
            "amara",
            "amara@example.com",
            crate::db::types::UserRole::Student,
            "amara-secret",
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": "different",
                    "email": "amara@example.com",
                    "password": "other-secret",
                    "role": "parent"
                })),
            ))
            .await
            .expect("register duplicate");

        assert_eq!(response.status(), StatusCode::CONFLICT);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(ctx.state.db())
            .await
            .expect("count users");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let ctx = test_support::setup_test_context().await;

        test_support::insert_user(
            ctx.state.db(),
            "amara",
            "amara@example.com",
            crate::db::types::UserRole::Student,
            "amara-secret",
        )
        .await;

        let wrong_password = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username_or_email": "amara", "password": "bad-guess"})),
            ))
            .await
            .expect("wrong password");
        let wrong_password_status = wrong_password.status();
        let wrong_password_body = test_support::read_json(wrong_password).await;

        let unknown_user = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"username_or_email": "nobody", "password": "bad-guess"})),
            ))
            .await
            .expect("unknown user");
        let unknown_user_status = unknown_user.status();
        let unknown_user_body = test_support::read_json(unknown_user).await;

        assert_eq!(wrong_password_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_user_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password_body["detail"], unknown_user_body["detail"]);
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({
                    "username": "amara",
                    "email": "amara@example.com",
                    "password": "short",
                    "role": "student"
                })),
            ))
            .await
            .expect("register");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
