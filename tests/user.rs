mod common;
use std::sync::Arc;

use axum::http::StatusCode;
use gritflow::ai::DisabledAi;
use gritflow::model::entity::{DEMO_USERNAME, UserEntity};
use gritflow::web::middlewares::AUTH_TOKEN;
use tower_cookies::cookie::SameSite;

use crate::common::{Action, Flow, setup_server, setup_server_with, setup_test_db, signin_action, signup_action};

#[tokio::test]
async fn route_signup_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(
            signup_action("foobar", "foobazbar")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_value(body.clone()).expect("Invalid body format");
                    assert_eq!(ent.username(), "foobar");
                    assert!(body.get("password_hash").is_none());
                })
                .with_expect(StatusCode::OK),
        )
        // try to signup twice
        .step(signup_action("foobar", "foobazbar").with_expect(StatusCode::CONFLICT))
        // too short
        .step(
            signup_action("shortpw", "123")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body["message"].as_str().unwrap().contains("password"))),
        )
        .step(signup_action("ab", "longenough").with_expect(StatusCode::BAD_REQUEST))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_signin_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        .step(signup_action("SIGNINTEST", "SIGNINTEST").with_save_cookies(false))
        .step(
            signin_action("SIGNINTEST", "SIGNINTEST")
                .assert_cookie(AUTH_TOKEN, |cookie| {
                    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
                    assert_eq!(cookie.path(), Some("/"));
                    assert_eq!(cookie.http_only(), Some(true));
                })
                .assert_body(|body| {
                    let ent: UserEntity = serde_json::from_value(body.clone()).expect("Invalid JSON format");
                    assert_eq!(ent.username(), "SIGNINTEST");
                })
                .with_expect(StatusCode::OK)
                .with_clear_cookies(true),
        )
        // wrong credentials
        .step(
            signin_action("SIGNINTEST", "WRONGPASSWORD")
                .with_save_cookies(false)
                .with_clear_cookies(true)
                .assert_body(|body| {
                    assert!(body["message"].as_str().unwrap().contains("Authentication error"));
                })
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        // non-existing account
        .step(signin_action("nonexisting", "nvmnvmnvm").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn demo_account_cannot_sign_in() {
    let pool = setup_test_db().await;
    let mut server = setup_server(&pool).await;

    Flow::new()
        // anonymous verify creates the demo account
        .step(
            Action::new("verify", "GET", "/api/v1/account/verify")
                .assert_body(|body| assert_eq!(body["demo"], true)),
        )
        .step(signin_action(DEMO_USERNAME, "!demo").with_expect(StatusCode::UNAUTHORIZED))
        .run(&mut server, &pool)
        .await;
}

#[tokio::test]
async fn route_verify_test() {
    let pool = setup_test_db().await;
    let mut server = setup_server_with(&pool, Arc::new(DisabledAi), false).await;

    Flow::new()
        .step(
            Action::new("verify_anonymous", "GET", "/api/v1/account/verify")
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .step(signup_action("verifier", "verifier-pw").with_save_as("verifier"))
        .step(
            Action::new("verify_signed_in", "GET", "/api/v1/account/verify")
                .assert_body(|body| {
                    assert_eq!(body["demo"], false);
                    assert_eq!(body["role"], "user");
                })
                .with_expect(StatusCode::OK),
        )
        .step(
            Action::new("verify_cookies_cleared", "GET", "/api/v1/account/verify")
                .with_clear_cookies(true)
                .with_expect(StatusCode::UNAUTHORIZED),
        )
        .run(&mut server, &pool)
        .await;
}
