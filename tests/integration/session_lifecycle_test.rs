//! Session Lifecycle Integration Tests
//!
//! Sign-in, credential transport precedence, revocation, and expiry of
//! server-side sessions through the composed application.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use gatehouse_auth::generate_token;
use serde_json::json;

use crate::common::{body_bytes, body_json, TestApp, JWT_SECRET};

const SESSION_URI: &str = "/v1/auth/verify-session";

#[tokio::test]
async fn test_sign_in_failures_are_bit_identical() {
    let app = TestApp::new();
    app.create_user("grace@example.com", "compilers");

    let wrong_password = app
        .post_json(
            "/v1/auth/sign-in",
            json!({"email": "grace@example.com", "password": "cobol"}),
        )
        .await;
    let unknown_email = app
        .post_json(
            "/v1/auth/sign-in",
            json!({"email": "ghost@example.com", "password": "compilers"}),
        )
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let a = body_bytes(wrong_password).await;
    let b = body_bytes(unknown_email).await;
    assert_eq!(a, b);
    assert_eq!(
        serde_json::from_slice::<serde_json::Value>(&a).unwrap(),
        json!({"message": "Invalid email or password"})
    );
}

#[tokio::test]
async fn test_session_round_trip() {
    let app = TestApp::new();
    let user = app.create_user("grace@example.com", "compilers");
    let token = app.sign_in("grace@example.com", "compilers").await;

    let res = app.get_with_bearer(SESSION_URI, &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["data"]["email"], "grace@example.com");
    assert_eq!(body["data"]["id"], json!(user.id));
}

#[tokio::test]
async fn test_credential_precedence() {
    let app = TestApp::new();
    app.create_user("grace@example.com", "compilers");
    let valid = app.sign_in("grace@example.com", "compilers").await;
    let revoked = generate_token(uuid::Uuid::now_v7(), JWT_SECRET, chrono::Duration::hours(1))
        .unwrap()
        .token;

    let request = |uri: String, cookie: Option<&str>, header: Option<&str>| {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", format!("token={}", cookie));
        }
        if let Some(header) = header {
            builder = builder.header("authorization", header);
        }
        builder.body(Body::empty()).unwrap()
    };

    // query beats cookie and header
    let res = app
        .send(request(
            format!("{}?token={}", SESSION_URI, valid),
            Some(&revoked),
            Some(&format!("Bearer {}", revoked)),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    // cookie beats header
    let res = app
        .send(request(
            SESSION_URI.to_string(),
            Some(&valid),
            Some(&format!("Bearer {}", revoked)),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .send(request(
            SESSION_URI.to_string(),
            Some(&revoked),
            Some(&format!("Bearer {}", valid)),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // an empty query value falls through to the header
    let res = app
        .send(request(
            format!("{}?token=", SESSION_URI),
            None,
            Some(&format!("Bearer {}", valid)),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_and_missing_credentials() {
    let app = TestApp::new();

    let cases = [
        (None, "Unauthorized, token not found"),
        (Some("token-only"), "Unauthorized, invalid token format"),
        (Some("Bearer "), "Unauthorized, invalid token format"),
        (Some("Bearer a b"), "Unauthorized, invalid token format"),
        (Some("Basic x"), "Unauthorized, invalid token format"),
    ];

    for (header, message) in cases {
        let mut builder = Request::builder().uri(SESSION_URI);
        if let Some(header) = header {
            builder = builder.header("authorization", header);
        }
        let res = app.send(builder.body(Body::empty()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(body_json(res).await, json!({"message": message}));
    }
}

#[tokio::test]
async fn test_sign_out_isolates_devices() {
    let app = TestApp::new();
    let user = app.create_user("grace@example.com", "compilers");
    let laptop = app.sign_in("grace@example.com", "compilers").await;
    let phone = app.sign_in("grace@example.com", "compilers").await;
    assert_eq!(app.sessions.sessions_for(user.id).len(), 2);

    let res = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/v1/auth/sign-out")
                .header("authorization", format!("Bearer {}", laptop))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.get_with_bearer(SESSION_URI, &laptop).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(res).await,
        json!({"message": "Unauthorized, session not found"})
    );

    let res = app.get_with_bearer(SESSION_URI, &phone).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stored_expiry_overrides_token_lifetime() {
    let app = TestApp::new();
    app.create_user("grace@example.com", "compilers");
    let token = app.sign_in("grace@example.com", "compilers").await;

    app.sessions.update(&token, |session| {
        session.expires_at = Utc::now() - chrono::Duration::seconds(1);
    });

    let res = app.get_with_bearer(SESSION_URI, &token).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(res).await,
        json!({"message": "Unauthorized, expired session"})
    );
}

#[tokio::test]
async fn test_session_store_outage_is_internal() {
    let app = TestApp::new();
    app.create_user("grace@example.com", "compilers");
    let token = app.sign_in("grace@example.com", "compilers").await;
    app.sessions.set_unavailable(true);

    let res = app.get_with_bearer(SESSION_URI, &token).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

mod common;
