//! Current-account endpoint.

use axum::{Json, extract::Extension, http::HeaderMap, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use super::auth::principal::require_auth;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MeResponse {
    pub account_id: String,
    pub email: String,
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Authenticated account", body = MeResponse),
        (status = 401, description = "No active session")
    ),
    tag = "betlink"
)]
pub async fn me(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    match require_auth(&headers, &pool).await {
        Ok(principal) => Json(MeResponse {
            account_id: principal.account_id.to_string(),
            email: principal.email,
            role: principal.role.to_string(),
        })
        .into_response(),
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn me_without_session_is_unauthorized() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool");
        let response = me(HeaderMap::new(), Extension(pool)).await.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
