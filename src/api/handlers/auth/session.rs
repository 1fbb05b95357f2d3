//! Session endpoints for cookie and bearer auth.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    events::AuthEvent,
    monitor::needs_refresh,
    state::{AuthConfig, AuthState},
    storage::{SessionRecord, SessionTokens, delete_session, lookup_session, refresh_session},
    types::{ErrorResponse, SessionResponse},
    utils::hash_session_token,
};
use crate::api::handlers::auth::errors::MSG_SESSION_INVALID;

const SESSION_COOKIE_NAME: &str = "betlink_session";
const REFRESH_COOKIE_NAME: &str = "betlink_refresh";

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    // Missing cookies are treated as "no session" to avoid leaking auth state.
    let Some(token) = extract_session_token(&headers) else {
        return StatusCode::NO_CONTENT.into_response();
    };
    // Only the hash is stored; never compare raw tokens against the database.
    let token_hash = hash_session_token(&token);
    let record = match lookup_session(&pool, &token_hash).await {
        Ok(Some(record)) => record,
        Ok(None) => return StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!(operation = "session.lookup", "failed to lookup session: {err:#}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    // Rotate the pair before serving the navigation when the session is close
    // to expiry; a rotation failure is logged and the current session served.
    let mut response_headers = HeaderMap::new();
    let mut expires_at = record.expires_at;
    if needs_refresh(record.expires_at, Utc::now()) {
        if let Some(tokens) = try_rotate(&pool, &auth_state, &headers).await {
            expires_at = tokens.expires_at;
            match session_cookies(auth_state.config(), &tokens) {
                Ok(cookies) => {
                    for cookie in cookies {
                        response_headers.append(SET_COOKIE, cookie);
                    }
                    auth_state.events().publish(AuthEvent::TokenRefreshed);
                }
                Err(err) => {
                    error!(operation = "session.refresh", "failed to build session cookies: {err}");
                }
            }
        }
    }

    let response = SessionResponse {
        account_id: record.account_id.to_string(),
        email: record.email,
        role: record.role,
        expires_at,
    };
    (StatusCode::OK, response_headers, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    responses(
        (status = 204, description = "Session refreshed"),
        (status = 401, description = "Unknown or expired refresh token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(tokens) = try_rotate(&pool, &auth_state, &headers).await else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(MSG_SESSION_INVALID)),
        )
            .into_response();
    };

    let mut response_headers = HeaderMap::new();
    match session_cookies(auth_state.config(), &tokens) {
        Ok(cookies) => {
            for cookie in cookies {
                response_headers.append(SET_COOKIE, cookie);
            }
            auth_state.events().publish(AuthEvent::TokenRefreshed);
            (StatusCode::NO_CONTENT, response_headers).into_response()
        }
        Err(err) => {
            error!(operation = "session.refresh", "failed to build session cookies: {err}");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(MSG_SESSION_INVALID)),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    if let Some(token) = extract_session_token(&headers) {
        let token_hash = hash_session_token(&token);
        if let Err(err) = delete_session(&pool, &token_hash).await {
            error!(operation = "session.delete", "failed to delete session: {err:#}");
        }
    }

    // Always clear the cookies, even if the session record was missing.
    let mut response_headers = HeaderMap::new();
    for cookie in clear_session_cookies(auth_state.config()) {
        response_headers.append(SET_COOKIE, cookie);
    }
    auth_state.events().publish(AuthEvent::SignedOut);
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

async fn try_rotate(
    pool: &PgPool,
    auth_state: &AuthState,
    headers: &HeaderMap,
) -> Option<SessionTokens> {
    let refresh_token = extract_cookie(headers, REFRESH_COOKIE_NAME)?;
    let refresh_hash = hash_session_token(&refresh_token);
    match refresh_session(pool, &refresh_hash, auth_state.config().session_ttl_seconds()).await {
        Ok(tokens) => tokens,
        Err(err) => {
            error!(operation = "session.rotate", "failed to rotate session: {err:#}");
            None
        }
    }
}

/// Resolve a session cookie into a session record, if present.
///
/// Returns `Ok(None)` when the cookie is missing or invalid.
pub(crate) async fn authenticate_session(
    headers: &HeaderMap,
    pool: &PgPool,
) -> Result<Option<SessionRecord>, StatusCode> {
    let Some(token) = extract_session_token(headers) else {
        return Ok(None);
    };
    let token_hash = hash_session_token(&token);
    match lookup_session(pool, &token_hash).await {
        Ok(record) => Ok(record),
        Err(err) => {
            error!(operation = "session.lookup", "failed to lookup session: {err:#}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Build the secure `HttpOnly` cookie pair for a fresh token pair.
///
/// Both cookies cover the whole application path and are limited to same-site
/// requests; the refresh cookie outlives the access cookie.
pub(super) fn session_cookies(
    auth_config: &AuthConfig,
    tokens: &SessionTokens,
) -> Result<[HeaderValue; 2], InvalidHeaderValue> {
    let access = build_cookie(
        auth_config,
        SESSION_COOKIE_NAME,
        &tokens.access_token,
        auth_config.session_ttl_seconds(),
    )?;
    let refresh = build_cookie(
        auth_config,
        REFRESH_COOKIE_NAME,
        &tokens.refresh_token,
        auth_config.refresh_ttl_seconds(),
    )?;
    Ok([access, refresh])
}

fn build_cookie(
    auth_config: &AuthConfig,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{name}={value}; Path=/; HttpOnly; SameSite=Strict; Max-Age={max_age}");
    if auth_config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookies(auth_config: &AuthConfig) -> Vec<HeaderValue> {
    [SESSION_COOKIE_NAME, REFRESH_COOKIE_NAME]
        .iter()
        .filter_map(|name| build_cookie(auth_config, name, "", 0).ok())
        .collect()
}

fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    extract_cookie(headers, SESSION_COOKIE_NAME)
}

fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == name && !val.is_empty() {
            return Some(val.to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn config(secure: bool) -> AuthConfig {
        if secure {
            AuthConfig::new("https://betlink.com".to_string())
        } else {
            AuthConfig::new("http://localhost:3000".to_string())
        }
    }

    fn tokens() -> SessionTokens {
        SessionTokens {
            access_token: "acesso".to_string(),
            refresh_token: "renovar".to_string(),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn session_cookies_are_scoped_and_http_only() {
        let [access, refresh] =
            session_cookies(&config(true), &tokens()).expect("cookie header values");
        let access = access.to_str().expect("ascii cookie");
        assert!(access.starts_with("betlink_session=acesso"));
        assert!(access.contains("Path=/"));
        assert!(access.contains("HttpOnly"));
        assert!(access.contains("SameSite=Strict"));
        assert!(access.contains("Secure"));

        let refresh = refresh.to_str().expect("ascii cookie");
        assert!(refresh.starts_with("betlink_refresh=renovar"));
        assert!(refresh.contains("Secure"));
    }

    #[test]
    fn development_cookies_skip_secure() {
        let [access, _refresh] =
            session_cookies(&config(false), &tokens()).expect("cookie header values");
        assert!(!access.to_str().expect("ascii cookie").contains("Secure"));
    }

    #[test]
    fn clear_cookies_expire_both_names() {
        let cleared = clear_session_cookies(&config(true));
        assert_eq!(cleared.len(), 2);
        for cookie in cleared {
            assert!(cookie.to_str().expect("ascii cookie").contains("Max-Age=0"));
        }
    }

    #[test]
    fn extract_session_token_prefers_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("betlink_session=fromcookie"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc".to_string()));
    }

    #[test]
    fn extract_cookie_parses_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("other=1; betlink_refresh=tok; betlink_session=acc"),
        );
        assert_eq!(
            extract_cookie(&headers, REFRESH_COOKIE_NAME),
            Some("tok".to_string())
        );
        assert_eq!(
            extract_cookie(&headers, SESSION_COOKIE_NAME),
            Some("acc".to_string())
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn extract_bearer_token_handles_case_and_empty() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn session_without_cookie_is_no_content() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool");
        let state = Arc::new(AuthState::new(config(true)));
        let response = session(HeaderMap::new(), Extension(pool), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool");
        let state = Arc::new(AuthState::new(config(true)));
        let response = refresh(HeaderMap::new(), Extension(pool), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn logout_without_cookie_still_clears() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool");
        let state = Arc::new(AuthState::new(config(true)));
        let (_handle, mut events) = state.events().subscribe();
        let response = logout(HeaderMap::new(), Extension(pool), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get_all(SET_COOKIE).iter().count() == 2);
        assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));
    }
}
