//! Registration endpoint (stricter validation path).

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use tracing::error;

use super::{
    errors::{MSG_EMAIL_TAKEN, MSG_INVALID_REQUEST, MSG_SERVER_ERROR},
    storage::{RegisterOutcome, insert_account},
    types::{ErrorResponse, FieldErrorResponse, RegisterRequest, RegisterResponse},
    utils::normalize_email,
    validate::validate_registration,
};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error", body = FieldErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Registration could not be completed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
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
    let field_errors = validate_registration(&email, &request);
    if !field_errors.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(FieldErrorResponse::from_fields(field_errors)),
        )
            .into_response();
    }

    match insert_account(
        &pool,
        &email,
        request.name.trim(),
        request.phone.as_deref(),
        request.telegram_username.as_deref(),
        &request.password,
    )
    .await
    {
        Ok(RegisterOutcome::Created(account_id)) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                account_id: account_id.to_string(),
            }),
        )
            .into_response(),
        Ok(RegisterOutcome::Conflict) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(MSG_EMAIL_TAKEN)),
        )
            .into_response(),
        Err(err) => {
            error!(operation = "register.insert", identifier = %email, "failed to create account: {err:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(MSG_SERVER_ERROR)),
            )
                .into_response()
        }
    }
}
