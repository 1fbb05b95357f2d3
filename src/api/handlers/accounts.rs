//! Administration-area account listing.

use anyhow::{Context, Result};
use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use tracing::{Instrument, error};
use utoipa::ToSchema;

use super::auth::principal::{authorize, require_auth};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccountSummary {
    pub account_id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/v1/admin/accounts",
    responses(
        (status = 200, description = "All registered accounts", body = [AccountSummary]),
        (status = 401, description = "No active session"),
        (status = 403, description = "Role may not enter the administration area", body = String)
    ),
    tag = "betlink"
)]
pub async fn list_accounts(headers: HeaderMap, pool: Extension<PgPool>) -> impl IntoResponse {
    let principal = match require_auth(&headers, &pool).await {
        Ok(principal) => principal,
        Err(status) => return status.into_response(),
    };
    if let Err((status, message)) = authorize(&principal, "/admin") {
        return (status, message.to_string()).into_response();
    }

    match fetch_accounts(&pool).await {
        Ok(accounts) => Json(accounts).into_response(),
        Err(err) => {
            error!(operation = "accounts.list", "failed to list accounts: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn fetch_accounts(pool: &PgPool) -> Result<Vec<AccountSummary>> {
    let query = r"
        SELECT id, email, name, role::text AS role, last_login_at
        FROM accounts
        ORDER BY created_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list accounts")?;

    Ok(rows
        .into_iter()
        .map(|row| AccountSummary {
            account_id: row.get::<uuid::Uuid, _>("id").to_string(),
            email: row.get("email"),
            name: row.get("name"),
            role: row.get("role"),
            last_login_at: row.get("last_login_at"),
        })
        .collect())
}
