//! Login endpoint: the full submission flow.
//!
//! Validate locally, consult the rate limiter, verify the password behind the
//! database trust boundary, gate the login area, establish the session, and
//! answer with the role's redirect. The flow returns a typed result up the
//! call chain; infrastructure detail is logged once here at the boundary and
//! the client only ever sees the fixed vocabulary. Nothing redirects or
//! succeeds silently.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::{
    errors::{
        MSG_ACCOUNT_LOCKED_NOW, MSG_INVALID_CREDENTIALS, MSG_INVALID_REQUEST, MSG_SERVER_ERROR,
        MSG_WRONG_AREA, msg_locked_minutes,
    },
    events::AuthEvent,
    rate_limit::{self, RateLimitDecision},
    roles::{Role, post_login_redirect},
    session::session_cookies,
    state::AuthState,
    storage::insert_session,
    types::{ErrorResponse, FieldErrorResponse, LoginRequest, LoginResponse},
    utils::normalize_email,
    validate::{FieldErrors, validate_login},
    verify::verify_credentials,
};

/// Why a login submission did not produce a session.
#[derive(Debug, thiserror::Error)]
pub(super) enum LoginFailure {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("account locked for {minutes_remaining} more minutes")]
    Locked { minutes_remaining: i64 },
    #[error("account locked by this attempt")]
    LockedNow,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("role not allowed in this login area")]
    WrongArea,
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = FieldErrorResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
        (status = 403, description = "Wrong login area for this role", body = ErrorResponse),
        (status = 423, description = "Account temporarily locked", body = ErrorResponse),
        (status = 500, description = "Login could not be completed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(MSG_INVALID_REQUEST)),
            )
                .into_response();
        }
    };

    let email = normalize_email(&request.email);
    match run_login(&pool, &auth_state, &email, &request).await {
        Ok((cookies, redirect)) => {
            let mut response_headers = HeaderMap::new();
            for cookie in cookies {
                response_headers.append(SET_COOKIE, cookie);
            }
            auth_state.events().publish(AuthEvent::SignedIn);
            (
                StatusCode::OK,
                response_headers,
                Json(LoginResponse {
                    success: true,
                    redirect,
                }),
            )
                .into_response()
        }
        Err(failure) => failure_response(&email, failure),
    }
}

/// Run the flow in order: local validation, rate limiter, password check,
/// area gate, session establishment. `email` must already be normalized.
async fn run_login(
    pool: &PgPool,
    auth_state: &AuthState,
    email: &str,
    request: &LoginRequest,
) -> Result<([HeaderValue; 2], String), LoginFailure> {
    // Local validation first: nothing below runs for malformed submissions.
    let field_errors = validate_login(email, &request.password);
    if !field_errors.is_empty() {
        return Err(LoginFailure::Validation(field_errors));
    }

    if let RateLimitDecision::Locked { minutes_remaining } = rate_limit::check(pool, email).await {
        return Err(LoginFailure::Locked { minutes_remaining });
    }

    let Some(verified) = verify_credentials(pool, email, &request.password).await? else {
        // Record the failure and answer generically; the locked message only
        // appears when this very failure tripped the lock.
        let failure = rate_limit::record_failure(pool, email).await;
        if failure.is_some_and(|failure| failure.locked) {
            return Err(LoginFailure::LockedNow);
        }
        return Err(LoginFailure::InvalidCredentials);
    };

    // Unreachable under the schema's role enum; log and fall back to the root
    // path rather than refusing a correctly verified login.
    let role = Role::from_db(&verified.role);
    if role.is_none() {
        error!(identifier = %email, role = %verified.role, "account has unknown role");
    }

    // Wrong login area: credentials were right, so the attempt counter stays
    // untouched, but no session is created either.
    if let (Some(area), Some(role)) = (request.area, role) {
        if !area.allows(role) {
            return Err(LoginFailure::WrongArea);
        }
    }

    // Bookkeeping: reset the counter, clear any lock, stamp the last login.
    rate_limit::record_success(pool, verified.account_id).await;

    // A verified password without a usable session is still a failed login.
    let tokens = insert_session(
        pool,
        verified.account_id,
        auth_state.config().session_ttl_seconds(),
    )
    .await?;
    let cookies = session_cookies(auth_state.config(), &tokens)
        .map_err(|err| anyhow::anyhow!("failed to build session cookies: {err}"))?;

    let redirect = role.map_or_else(
        || "/".to_string(),
        |role| post_login_redirect(role, request.return_to.as_deref()),
    );

    Ok((cookies, redirect))
}

fn failure_response(email: &str, failure: LoginFailure) -> Response {
    match failure {
        LoginFailure::Validation(fields) => (
            StatusCode::BAD_REQUEST,
            Json(FieldErrorResponse::from_fields(fields)),
        )
            .into_response(),
        LoginFailure::Locked { minutes_remaining } => (
            StatusCode::LOCKED,
            Json(ErrorResponse::new(msg_locked_minutes(minutes_remaining))),
        )
            .into_response(),
        LoginFailure::LockedNow => (
            StatusCode::LOCKED,
            Json(ErrorResponse::new(MSG_ACCOUNT_LOCKED_NOW)),
        )
            .into_response(),
        LoginFailure::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(MSG_INVALID_CREDENTIALS)),
        )
            .into_response(),
        LoginFailure::WrongArea => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(MSG_WRONG_AREA)),
        )
            .into_response(),
        LoginFailure::Infrastructure(err) => {
            error!(operation = "login", identifier = %email, "login failed: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(MSG_SERVER_ERROR)),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use axum::body::to_bytes;
    use serde_json::Value;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(AuthConfig::new(
            "https://betlink.com".to_string(),
        )))
    }

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn login_missing_payload() {
        let response = login(Extension(lazy_pool()), Extension(auth_state()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejects_malformed_email_without_touching_database() {
        // The lazy pool has no live connection: reaching the limiter or the
        // verifier would surface as a non-400 status.
        let request = LoginRequest {
            email: "not-an-email".to_string(),
            password: "segredo123".to_string(),
            area: None,
            return_to: None,
        };
        let response = login(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body.pointer("/errors/email").and_then(Value::as_str),
            Some("Email inválido")
        );
    }

    #[tokio::test]
    async fn login_reports_short_password_inline() {
        let request = LoginRequest {
            email: "admin@betlink.com".to_string(),
            password: "curta1".to_string(),
            area: None,
            return_to: None,
        };
        let response = login(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(request)),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(
            body.pointer("/errors/password").and_then(Value::as_str),
            Some("Senha deve ter no mínimo 8 caracteres")
        );
    }

    #[test]
    fn failure_responses_carry_the_fixed_vocabulary() {
        let locked = failure_response("a@b.co", LoginFailure::Locked {
            minutes_remaining: 3,
        });
        assert_eq!(locked.status(), StatusCode::LOCKED);

        let credentials = failure_response("a@b.co", LoginFailure::InvalidCredentials);
        assert_eq!(credentials.status(), StatusCode::UNAUTHORIZED);

        let area = failure_response("a@b.co", LoginFailure::WrongArea);
        assert_eq!(area.status(), StatusCode::FORBIDDEN);

        let infra = failure_response(
            "a@b.co",
            LoginFailure::Infrastructure(anyhow::anyhow!("pool exhausted")),
        );
        assert_eq!(infra.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
