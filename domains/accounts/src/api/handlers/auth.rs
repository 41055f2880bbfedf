//! Auth flow API handlers
//!
//! Implements the account lifecycle endpoints:
//! - POST /v1/auth/sign-up - Register an identity and mail a verification link
//! - POST /v1/auth/sign-in - Exchange email + password for a session token
//! - POST /v1/auth/verify-registration - Consume a verification token
//! - GET /v1/auth/verify-session - Profile of the session owner
//! - POST /v1/auth/sign-out - Delete the caller's session

use std::sync::OnceLock;

use axum::{extract::State, Json};
use chrono::Utc;
use gatehouse_auth::{generate_token, verify_token, AuthUser, BearerToken, Session};
use gatehouse_common::{
    ApiResponse, ClientInfo, Error, MessageResponse, PasswordHasher, RepositoryError, Result,
    ValidatedJson,
};
use gatehouse_email::{EmailTemplate, RegistrationEmail, REGISTRATION_SUBJECT};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::AccountsState;
use crate::domain::entities::{NewUser, User, VerificationRecord, VERIFICATION_TTL_DAYS};

/// Single message for every sign-in failure the caller could fix
const INVALID_CREDENTIALS: &str = "Invalid email or password";

const INVALID_TOKEN: &str = "Invalid token";

/// Request for creating an account
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,

    #[validate(length(max = 100))]
    pub last_name: Option<String>,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,

    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

/// Request for signing in
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Request carrying a mailed verification token
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRegistrationRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

/// Data returned by a successful sign-in
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub uid: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub access_token: String,
}

/// Hash of a throwaway password, computed once per process
fn decoy_hash(hasher: &dyn PasswordHasher) -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hasher.hash("gatehouse-decoy-password").ok())
        .as_deref()
}

fn internal(context: &str) -> impl FnOnce(RepositoryError) -> Error + '_ {
    move |e| {
        tracing::error!(error = %e, "{}", context);
        Error::Internal(format!("{}: {}", context, e))
    }
}

/// POST /v1/auth/sign-up - Register an identity
pub async fn sign_up(
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> Result<Json<MessageResponse>> {
    if state
        .accounts
        .get_by_email(&request.email)
        .await
        .map_err(internal("Failed to look up email"))?
        .is_some()
    {
        return Err(Error::Conflict("Email already registered".to_string()));
    }

    let user = NewUser {
        first_name: request.first_name,
        last_name: request.last_name,
        email: request.email,
        phone: request.phone,
        password: request.password,
    }
    .before_create(state.hasher.as_ref())
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to hash password");
        Error::Internal(format!("Failed to hash password: {}", e))
    })?;

    let issued = generate_token(
        user.id,
        &state.auth.config().jwt_secret,
        chrono::Duration::days(VERIFICATION_TTL_DAYS),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign verification token: {}", e)))?;
    let record = VerificationRecord::new(user.id, &issued);

    match state.accounts.create_with_verification(&user, &record).await {
        Ok(()) => {}
        Err(RepositoryError::AlreadyExists) => {
            return Err(Error::Conflict("Email already registered".to_string()));
        }
        Err(e) => return Err(internal("Failed to create account")(e)),
    }

    tracing::info!(user_id = %user.id, "Account created");

    let template = EmailTemplate::Registration(RegistrationEmail {
        fullname: user.full_name(),
        link: state.settings.verification_link(&issued.token),
        app_name: state.settings.app_name.clone(),
    });

    // the account stays committed when delivery fails
    state
        .email
        .send_template(REGISTRATION_SUBJECT, &user.email, &template)
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                user_id = %user.id,
                provider = state.email.service_name(),
                "Failed to send registration email"
            );
            Error::Internal(format!("Failed to send registration email: {}", e))
        })?;

    Ok(Json(MessageResponse::new("Sign up successfully")))
}

/// POST /v1/auth/sign-in - Open a session
pub async fn sign_in(
    State(state): State<AccountsState>,
    client: ClientInfo,
    ValidatedJson(request): ValidatedJson<SignInRequest>,
) -> Result<Json<ApiResponse<SignInResponse>>> {
    let user = state
        .accounts
        .get_by_email(&request.email)
        .await
        .map_err(internal("Failed to look up identity"))?;

    let Some((user, hash)) = user.and_then(|u| {
        let hash = u.password.clone()?;
        Some((u, hash))
    }) else {
        // every failure path runs exactly one password verification
        if let Some(decoy) = decoy_hash(state.hasher.as_ref()) {
            let _ = state.hasher.compare(decoy, &request.password);
        }
        tracing::debug!("Sign-in for unknown email or identity without a password");
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let matches = state
        .hasher
        .compare(&hash, &request.password)
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "Failed to compare password");
            Error::Internal(format!("Failed to compare password: {}", e))
        })?;
    if !matches {
        tracing::debug!(user_id = %user.id, "Sign-in with wrong password");
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let issued = state
        .auth
        .issue_token(user.id)
        .map_err(|e| Error::Internal(format!("Failed to sign session token: {}", e)))?;

    let session = Session::new(user.id, &issued, &client);
    state.auth.sessions().insert(&session).await.map_err(|e| {
        tracing::error!(error = %e, user_id = %user.id, "Failed to create session");
        Error::Internal(format!("Failed to create session: {}", e))
    })?;

    tracing::info!(user_id = %user.id, session_id = %session.id, "Signed in");

    Ok(Json(ApiResponse::new(
        "Sign in successfully",
        SignInResponse {
            uid: user.id,
            display_name: user.full_name(),
            is_admin: user.is_admin(),
            email: user.email,
            access_token: issued.token,
        },
    )))
}

/// POST /v1/auth/verify-registration - Activate the identity behind a token
pub async fn verify_registration(
    State(state): State<AccountsState>,
    ValidatedJson(request): ValidatedJson<VerifyRegistrationRequest>,
) -> Result<Json<MessageResponse>> {
    let token = request.token;

    let user_id = verify_token(&token, &state.auth.config().jwt_secret)
        .ok()
        .and_then(|claims| claims.subject())
        .ok_or_else(|| Error::Unauthorized(INVALID_TOKEN.to_string()))?;

    let record = state
        .accounts
        .get_verification(user_id, &token)
        .await
        .map_err(internal("Failed to load verification record"))?
        .ok_or_else(|| Error::Unauthorized(INVALID_TOKEN.to_string()))?;

    if record.is_consumed() {
        return Err(Error::BadRequest("Token already used".to_string()));
    }
    let now = Utc::now();
    if record.is_expired_at(now) {
        tracing::debug!(user_id = %user_id, "Verification token expired");
        return Err(Error::BadRequest("Token expired".to_string()));
    }

    match state.accounts.activate(user_id, &token, now).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Account activated");
            Ok(Json(MessageResponse::new("Verify registration successfully")))
        }
        // lost a race with a concurrent verification of the same token
        Err(RepositoryError::NotFound) => {
            Err(Error::BadRequest("Token already used".to_string()))
        }
        Err(e) => Err(internal("Failed to activate account")(e)),
    }
}

/// GET /v1/auth/verify-session - Profile of the session owner
pub async fn verify_session(
    AuthUser(context): AuthUser,
    State(state): State<AccountsState>,
) -> Result<Json<ApiResponse<User>>> {
    let user = state
        .accounts
        .get(context.user_id)
        .await
        .map_err(internal("Failed to load identity"))?
        .ok_or_else(|| Error::Unauthorized("Unauthorized, identity not found".to_string()))?;

    Ok(Json(ApiResponse::new("Verify session successfully", user)))
}

/// POST /v1/auth/sign-out - Delete only the presented session
pub async fn sign_out(
    AuthUser(context): AuthUser,
    BearerToken(token): BearerToken,
    State(state): State<AccountsState>,
) -> Result<Json<MessageResponse>> {
    let removed = state
        .auth
        .sessions()
        .delete(context.user_id, &token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %context.user_id, "Failed to delete session");
            Error::Internal(format!("Failed to delete session: {}", e))
        })?;

    if removed {
        tracing::info!(user_id = %context.user_id, session_id = %context.session_id, "Signed out");
    } else {
        tracing::warn!(user_id = %context.user_id, "Session already gone at sign-out");
    }

    Ok(Json(MessageResponse::new("Sign out successfully")))
}
