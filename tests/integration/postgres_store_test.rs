//! Postgres store tests
//!
//! Exercise the real account and session stores against a migrated
//! database. Run with `cargo test -- --ignored` and `TEST_DATABASE_URL`
//! (or `DATABASE_URL`) pointing at a disposable database: every test empties
//! the account tables first.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use gatehouse_accounts::{AccountStore, NewUser, PgAccountStore, User, VerificationRecord};
use gatehouse_auth::{
    IdentityReader, IssuedToken, PgIdentityReader, PgSessionStore, Session, SessionStore,
};
use gatehouse_common::{Argon2Hasher, ClientInfo, Pagination, RepositoryError};
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use common::{body_json, PgTestApp};

fn new_user(email: &str) -> User {
    NewUser {
        first_name: "Pg".to_string(),
        last_name: None,
        email: email.to_string(),
        phone: None,
        password: "password123".to_string(),
    }
    .before_create(&Argon2Hasher::new())
    .unwrap()
}

fn issued(token: &str) -> IssuedToken {
    IssuedToken {
        token: token.to_string(),
        expires_at: Utc::now() + Duration::days(1),
    }
}

fn session(user_id: Uuid, token: &str) -> Session {
    Session::new(
        user_id,
        &issued(token),
        &ClientInfo {
            ip_address: "127.0.0.1".to_string(),
            user_agent: "postgres-store-test".to_string(),
        },
    )
}

async fn seed(accounts: &PgAccountStore, email: &str, token: &str) -> User {
    let user = new_user(email);
    accounts
        .create_with_verification(&user, &VerificationRecord::new(user.id, &issued(token)))
        .await
        .unwrap();
    user
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_sign_up_rolls_back_identity_when_record_insert_fails() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    let existing = seed(&accounts, "first@example.com", "shared-token").await;

    // same (user_id, token) primary key as the committed record
    let second = new_user("second@example.com");
    let clashing = VerificationRecord::new(existing.id, &issued("shared-token"));

    let result = accounts.create_with_verification(&second, &clashing).await;
    assert!(matches!(result, Err(RepositoryError::AlreadyExists)));

    assert_eq!(accounts.get(second.id).await.unwrap(), None);
    assert_eq!(
        accounts.get_by_email("second@example.com").await.unwrap(),
        None
    );
    assert_eq!(app.count("users").await, 1);
    assert_eq!(app.count("user_verify_accounts").await, 1);
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_duplicate_email_is_already_exists() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    seed(&accounts, "dup@example.com", "t1").await;

    let again = new_user("dup@example.com");
    let result = accounts
        .create_with_verification(&again, &VerificationRecord::new(again.id, &issued("t2")))
        .await;
    assert!(matches!(result, Err(RepositoryError::AlreadyExists)));
    assert_eq!(app.count("users").await, 1);
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_verification_record_is_consumed_once() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    let user = seed(&accounts, "once@example.com", "verify-once").await;

    let record = accounts
        .get_verification(user.id, "verify-once")
        .await
        .unwrap()
        .unwrap();
    assert!(!record.is_consumed());
    assert_eq!(
        accounts.get_verification(user.id, "other-token").await.unwrap(),
        None
    );

    let activated = accounts
        .activate(user.id, "verify-once", Utc::now())
        .await
        .unwrap();
    assert!(activated.is_active());

    assert!(matches!(
        accounts.activate(user.id, "verify-once", Utc::now()).await,
        Err(RepositoryError::NotFound)
    ));
    assert!(accounts
        .get_verification(user.id, "verify-once")
        .await
        .unwrap()
        .unwrap()
        .is_consumed());
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_session_delete_is_scoped_to_identity_and_token() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    let sessions = PgSessionStore::new(app.pool.clone());
    let owner = seed(&accounts, "owner@example.com", "v1").await;
    let other = seed(&accounts, "other@example.com", "v2").await;

    sessions.insert(&session(owner.id, "laptop")).await.unwrap();
    sessions.insert(&session(owner.id, "phone")).await.unwrap();

    assert!(!sessions.delete(other.id, "laptop").await.unwrap());
    assert!(sessions.delete(owner.id, "laptop").await.unwrap());
    assert!(!sessions.delete(owner.id, "laptop").await.unwrap());

    assert_eq!(sessions.get_by_token("laptop").await.unwrap(), None);
    let phone = sessions.get_by_token("phone").await.unwrap().unwrap();
    assert_eq!(phone.user_id, owner.id);
    assert_eq!(sessions.get_by_token("never-issued").await.unwrap(), None);
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_session_list_pages_newest_first_with_total() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    let sessions = PgSessionStore::new(app.pool.clone());
    let user = seed(&accounts, "lister@example.com", "v1").await;

    let base = Utc::now();
    let mut ids = Vec::new();
    for i in 0..3 {
        let mut s = session(user.id, &format!("list-{}", i));
        s.created_at = base + Duration::seconds(i);
        sessions.insert(&s).await.unwrap();
        ids.push(s.id);
    }

    let (page, total) = sessions
        .list(&Pagination {
            offset: Some(0),
            limit: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(
        page.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );

    let (page, total) = sessions
        .list(&Pagination {
            offset: Some(2),
            limit: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(page.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[0]]);
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_identity_reader_hides_deleted_identities() {
    let app = PgTestApp::new().await;
    let accounts = PgAccountStore::new(app.pool.clone());
    let reader = PgIdentityReader::new(app.pool.clone());
    let user = seed(&accounts, "reader@example.com", "v1").await;

    assert_eq!(reader.role_of(user.id).await.unwrap(), Some(user.role_id));

    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&app.pool)
        .await
        .unwrap();
    assert_eq!(reader.role_of(user.id).await.unwrap(), None);
    assert_eq!(accounts.get(user.id).await.unwrap(), None);
}

#[tokio::test]
#[serial]
#[ignore] // Requires database setup
async fn test_registration_and_sign_out_over_postgres() {
    let app = PgTestApp::new().await;

    let res = app
        .post_json(
            "/v1/auth/sign-up",
            json!({"first_name": "Ada", "email": "ada@example.com", "password": "analytical"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token = app
        .email
        .get_verification_token_for("ada@example.com")
        .unwrap();

    let res = app
        .post_json("/v1/auth/verify-registration", json!({"token": token}))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .post_json("/v1/auth/verify-registration", json!({"token": token}))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Token already used");

    let res = app
        .post_json(
            "/v1/auth/sign-in",
            json!({"email": "ada@example.com", "password": "analytical"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let access = body_json(res).await["data"]["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_eq!(app.count("sessions").await, 1);

    let res = app
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/v1/auth/sign-out")
                .header("authorization", format!("Bearer {}", access))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(app.count("sessions").await, 0);
}
