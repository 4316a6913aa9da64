//! Session guard. Admits a request when the session cookie is present; the
//! cookie's value is never verified, authentication lives elsewhere.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::ErrorResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Unauthorized,
    RedirectToLogin,
    RedirectToDashboard,
}

fn is_public(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/") || path.starts_with("/files/")
}

pub fn decide(path: &str, has_session: bool) -> GuardDecision {
    if is_public(path) {
        return GuardDecision::Allow;
    }
    if path == "/login" {
        return if has_session {
            GuardDecision::RedirectToDashboard
        } else {
            GuardDecision::Allow
        };
    }
    if has_session {
        GuardDecision::Allow
    } else if path == "/api" || path.starts_with("/api/") {
        GuardDecision::Unauthorized
    } else {
        GuardDecision::RedirectToLogin
    }
}

/// True when a non-empty cookie named `name` is sent
pub fn has_cookie(headers: &HeaderMap, name: &str) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(key, value)| key.trim() == name && !value.trim().is_empty())
}

/// `/login?redirect=` carrying the percent-encoded path and query
pub fn login_redirect(uri: &Uri) -> String {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    format!("/login?redirect={}", urlencoding::encode(target))
}

pub async fn require_session(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let has_session = has_cookie(request.headers(), &config.session_cookie);

    match decide(&path, has_session) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authorization required")),
        )
            .into_response(),
        GuardDecision::RedirectToLogin => {
            Redirect::temporary(&login_redirect(request.uri())).into_response()
        }
        GuardDecision::RedirectToDashboard => Redirect::temporary("/dashboard").into_response(),
    }
}
