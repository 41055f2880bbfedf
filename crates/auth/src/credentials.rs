//! Bearer credential extraction
//!
//! Sources are tried in a fixed order, the first non-empty value wins:
//! query parameter `token`, cookie `token`, then `Authorization: Bearer <token>`.
//! Cookie values may be double-quoted and are percent-decoded; a cookie that
//! does not decode to UTF-8 is skipped.

use std::collections::HashMap;

use axum::{
    extract::Query,
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};

const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("token not found")]
    NotFound,

    #[error("invalid token format")]
    InvalidFormat,
}

/// Pull the bearer token out of a request.
pub fn extract_token(parts: &Parts) -> Result<String, CredentialError> {
    if let Some(token) = from_query(parts) {
        return Ok(token);
    }
    if let Some(token) = from_cookie(parts) {
        return Ok(token);
    }
    from_authorization(parts)
}

fn from_query(parts: &Parts) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).ok()?;
    params.get(TOKEN_KEY).filter(|v| !v.is_empty()).cloned()
}

fn from_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(name, _)| *name == TOKEN_KEY)
        .filter_map(|(_, value)| decode_cookie_value(value))
        .find(|value| !value.is_empty())
}

fn decode_cookie_value(raw: &str) -> Option<String> {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw);
    urlencoding::decode(unquoted).ok().map(|v| v.into_owned())
}

fn from_authorization(parts: &Parts) -> Result<String, CredentialError> {
    let header = match parts.headers.get(AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(CredentialError::NotFound),
    };

    let header = header
        .to_str()
        .map_err(|_| CredentialError::InvalidFormat)?;

    match header.split(' ').collect::<Vec<_>>().as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(token.to_string()),
        _ => Err(CredentialError::InvalidFormat),
    }
}
