//! Custom axum extractors for Gatehouse

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header::USER_AGENT, request::Parts},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::{Error, FieldError, MessageResponse};

/// Default page size for list endpoints
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for list endpoints
const MAX_LIMIT: i64 = 100;

/// Pagination query parameters for list endpoints
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl Pagination {
    /// Get the offset, defaulting to 0
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Get the limit, defaulting to 50, capped at 100
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// JSON extractor that validates the deserialized value automatically.
///
/// Bodies that are not JSON at all are rejected with 400 and a single
/// message. Missing or wrongly typed fields, and values that violate
/// constraints, are rejected with 400 and one
/// `{field, constraint, rejectedValue}` record per failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

/// Rejection type for `ValidatedJson`
#[derive(Debug)]
pub enum ValidatedJsonRejection {
    Json(JsonRejection),
    Validation(Error),
}

impl IntoResponse for ValidatedJsonRejection {
    fn into_response(self) -> Response {
        match self {
            ValidatedJsonRejection::Json(JsonRejection::JsonSyntaxError(e)) => {
                tracing::debug!(error = %e.body_text(), "Rejected request body");
                Error::BadRequest("Malformed JSON body".to_string()).into_response()
            }
            // content type and body size keep axum's status
            ValidatedJsonRejection::Json(e) => {
                (e.status(), Json(MessageResponse::new(e.body_text()))).into_response()
            }
            ValidatedJsonRejection::Validation(e) => e.into_response(),
        }
    }
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidatedJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<serde_json::Value>::from_request(req, state)
            .await
            .map_err(ValidatedJsonRejection::Json)?;
        if !raw.is_object() {
            return Err(ValidatedJsonRejection::Validation(not_an_object()));
        }

        let value: T = serde_path_to_error::deserialize(&raw)
            .map_err(|e| ValidatedJsonRejection::Validation(shape_error(&e, &raw)))?;

        value.validate().map_err(|e| {
            ValidatedJsonRejection::Validation(Error::ValidationFailed(
                FieldError::from_validation(&e),
            ))
        })?;
        Ok(ValidatedJson(value))
    }
}

/// Turn a failed typed deserialization of an already parsed body into a
/// field record: `required` for absent fields, `type` for the rest.
fn shape_error(
    err: &serde_path_to_error::Error<serde_json::Error>,
    raw: &serde_json::Value,
) -> Error {
    let path = err.path();
    let at_root = path.iter().next().is_none();
    let message = err.inner().to_string();

    if let Some(name) = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.strip_suffix('`'))
    {
        let field = if at_root {
            name.to_string()
        } else {
            format!("{}.{}", path, name)
        };
        return Error::ValidationFailed(vec![FieldError::new(
            field,
            "required",
            serde_json::Value::Null,
        )]);
    }

    if at_root {
        tracing::debug!(error = %message, "Request body has an unexpected shape");
        return not_an_object();
    }

    let rejected = json_pointer(path)
        .and_then(|pointer| raw.pointer(&pointer).cloned())
        .unwrap_or(serde_json::Value::Null);
    Error::ValidationFailed(vec![FieldError::new(path.to_string(), "type", rejected)])
}

fn not_an_object() -> Error {
    Error::BadRequest("Request body must be a JSON object".to_string())
}

fn json_pointer(path: &serde_path_to_error::Path) -> Option<String> {
    use serde_path_to_error::Segment;

    let mut pointer = String::new();
    for segment in path.iter() {
        pointer.push('/');
        match segment {
            Segment::Map { key } => pointer.push_str(&key.replace('~', "~0").replace('/', "~1")),
            Segment::Seq { index } => pointer.push_str(&index.to_string()),
            Segment::Enum { .. } | Segment::Unknown => return None,
        }
    }
    Some(pointer)
}

/// Network identity of the caller, captured when a session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Resolve the client address: first `X-Forwarded-For` hop, then
    /// `X-Real-IP`, then the peer socket address when the server exposes it.
    pub fn from_parts(parts: &Parts) -> Self {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| header("x-real-ip").map(str::to_string))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_default();

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    #[mutants::skip] // Delegates to ClientInfo::from_parts
    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_parts(parts))
    }
}
