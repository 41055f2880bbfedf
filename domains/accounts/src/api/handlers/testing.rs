//! Router harness over in-memory collaborators

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use gatehouse_auth::{mock::MockSessionStore, AuthBackend, AuthConfig};
use gatehouse_common::{Argon2Hasher, PasswordHasher};
use gatehouse_email::mock::MockEmailService;
use serde_json::Value;
use tower::ServiceExt;

use crate::api::{routes, AccountSettings, AccountsState};
use crate::domain::entities::{NewUser, User};
use crate::repository::mock::MockAccountStore;

pub(crate) async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub(crate) struct Harness {
    pub router: Router,
    pub accounts: MockAccountStore,
    pub sessions: MockSessionStore,
    pub email: MockEmailService,
    hasher: Arc<dyn PasswordHasher>,
}

impl Harness {
    pub const SECRET: &'static str = "accounts-handler-secret";

    pub fn new() -> Self {
        Self::with_hasher(Arc::new(Argon2Hasher::new()))
    }

    pub fn with_hasher(hasher: Arc<dyn PasswordHasher>) -> Self {
        let accounts = MockAccountStore::new();
        let sessions = MockSessionStore::new();
        let email = MockEmailService::new();

        let auth = AuthBackend::new(
            AuthConfig::new(Self::SECRET, chrono::Duration::days(1)),
            Arc::new(sessions.clone()),
            Arc::new(accounts.clone()),
        );
        let state = AccountsState {
            accounts: Arc::new(accounts.clone()),
            auth,
            email: Arc::new(email.clone()),
            hasher: hasher.clone(),
            settings: AccountSettings {
                app_name: "gatehouse".to_string(),
                client_url: "http://localhost:3000".to_string(),
            },
        };

        Self {
            router: routes(&state).with_state(state),
            accounts,
            sessions,
            email,
            hasher,
        }
    }

    /// Store an identity with a hashed password, skipping sign-up
    pub fn seed_user(&self, email: &str, password: &str) -> User {
        let user = NewUser {
            first_name: "Grace".to_string(),
            last_name: Some("Hopper".to_string()),
            email: email.to_string(),
            phone: None,
            password: password.to_string(),
        }
        .before_create(self.hasher.as_ref())
        .unwrap();
        self.accounts.insert_user(user.clone());
        user
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_with_token(&self, uri: &str, token: &str) -> Response<Body> {
        self.request(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    /// Sign in through the router and return the access token
    pub async fn sign_in(&self, email: &str, password: &str) -> String {
        let res = self
            .post(
                "/v1/auth/sign-in",
                serde_json::json!({"email": email, "password": password}),
            )
            .await;
        let body = body_json(res).await;
        body["data"]["access_token"].as_str().unwrap().to_string()
    }
}
