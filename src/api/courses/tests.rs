use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support;

#[tokio::test]
async fn teacher_creates_updates_and_lists_courses() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "mr-okafor",
        "okafor@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({"title": "Mathematics", "description": "Algebra and geometry"})),
        ))
        .await
        .expect("create course");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["title"], "Mathematics");
    assert_eq!(created["teacher_id"], teacher.id.as_str());
    let course_id = created["id"].as_str().expect("course id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/courses/{course_id}"),
            Some(&token),
            Some(json!({"title": "Mathematics II"})),
        ))
        .await
        .expect("update course");

    let status = response.status();
    let updated = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {updated}");
    assert_eq!(updated["title"], "Mathematics II");
    assert_eq!(updated["description"], "Algebra and geometry");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/courses", Some(&token), None))
        .await
        .expect("list courses");

    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn course_management_is_owner_only() {
    let ctx = test_support::setup_test_context().await;

    let owner = test_support::insert_user(
        ctx.state.db(),
        "mr-okafor",
        "okafor@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let rival = test_support::insert_user(
        ctx.state.db(),
        "ms-bello",
        "bello@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let course = test_support::insert_course(ctx.state.db(), "Mathematics", &owner.id).await;

    let rival_token = test_support::bearer_token(&rival.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/courses/{}", course.id),
            Some(&rival_token),
            Some(json!({"title": "Hijacked"})),
        ))
        .await
        .expect("update course");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let unchanged = crate::repositories::courses::fetch_one_by_id(ctx.state.db(), &course.id)
        .await
        .expect("course");
    assert_eq!(unchanged.title, "Mathematics");
}

#[tokio::test]
async fn student_cannot_create_courses() {
    let ctx = test_support::setup_test_context().await;

    let student = test_support::insert_user(
        ctx.state.db(),
        "amara",
        "amara@example.com",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/courses",
            Some(&token),
            Some(json!({"title": "Forbidden"})),
        ))
        .await
        .expect("create course");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn enrollment_rejects_duplicates_and_non_students() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "mr-okafor",
        "okafor@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    test_support::insert_user(
        ctx.state.db(),
        "amara",
        "amara@example.com",
        UserRole::Student,
        "student-pass",
    )
    .await;
    test_support::insert_user(
        ctx.state.db(),
        "ngozi",
        "ngozi@example.com",
        UserRole::Parent,
        "parent-pass",
    )
    .await;
    let course = test_support::insert_course(ctx.state.db(), "Mathematics", &teacher.id).await;
    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());

    let enroll = |username: &str| {
        test_support::json_request(
            Method::POST,
            &format!("/api/v1/courses/{}/students", course.id),
            Some(&token),
            Some(json!({"username": username})),
        )
    };

    let response = ctx.app.clone().oneshot(enroll("amara")).await.expect("enroll");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = ctx.app.clone().oneshot(enroll("amara")).await.expect("enroll again");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Parents are not enrollable.
    let response = ctx.app.clone().oneshot(enroll("ngozi")).await.expect("enroll parent");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/courses/{}/students", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("roster");
    let roster = test_support::read_json(response).await;
    assert_eq!(roster.as_array().map(Vec::len), Some(1));
    assert_eq!(roster[0]["username"], "amara");
}

#[tokio::test]
async fn deleting_course_cascades_to_assignments_and_enrollments() {
    let ctx = test_support::setup_test_context().await;

    let teacher = test_support::insert_user(
        ctx.state.db(),
        "mr-okafor",
        "okafor@example.com",
        UserRole::Teacher,
        "teacher-pass",
    )
    .await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "amara",
        "amara@example.com",
        UserRole::Student,
        "student-pass",
    )
    .await;
    let course = test_support::insert_course(ctx.state.db(), "Mathematics", &teacher.id).await;
    test_support::enroll_student(ctx.state.db(), &course.id, &student.id).await;
    test_support::insert_assignment(ctx.state.db(), &course.id, "Homework 1").await;

    let token = test_support::bearer_token(&teacher.id, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/courses/{}", course.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete course");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let assignments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM assignments")
        .fetch_one(ctx.state.db())
        .await
        .expect("count assignments");
    let enrollments: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
        .fetch_one(ctx.state.db())
        .await
        .expect("count enrollments");
    assert_eq!(assignments, 0);
    assert_eq!(enrollments, 0);
}
