//! Database helpers for accounts and sessions.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::utils::{generate_session_token, hash_session_token, is_unique_violation};

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum RegisterOutcome {
    Created(Uuid),
    Conflict,
}

/// Raw token pair handed to the client exactly once; only hashes persist.
#[derive(Debug)]
pub(super) struct SessionTokens {
    pub(super) access_token: String,
    pub(super) refresh_token: String,
    pub(super) expires_at: DateTime<Utc>,
}

/// Minimal data returned for a valid session cookie.
pub(crate) struct SessionRecord {
    pub(crate) account_id: Uuid,
    pub(crate) email: String,
    pub(crate) role: String,
    pub(crate) expires_at: DateTime<Utc>,
}

/// Create an account with the default `cliente` role. The password is hashed
/// inside Postgres (`crypt`), so the application never handles the hash.
pub(super) async fn insert_account(
    pool: &PgPool,
    email: &str,
    name: &str,
    phone: Option<&str>,
    telegram_username: Option<&str>,
    password: &str,
) -> Result<RegisterOutcome> {
    let query = r"
        INSERT INTO accounts (email, name, phone, telegram_username, password_hash)
        VALUES ($1, $2, $3, $4, crypt($5, gen_salt('bf')))
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(name)
        .bind(phone)
        .bind(telegram_username)
        .bind(password)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(RegisterOutcome::Created(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(RegisterOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

/// Create a session for a verified account.
///
/// Generates the access/refresh pair, stores only their hashes, and returns
/// the raw values so the caller can set the cookies.
pub(super) async fn insert_session(
    pool: &PgPool,
    account_id: Uuid,
    ttl_seconds: i64,
) -> Result<SessionTokens> {
    let query = r"
        INSERT INTO account_sessions (account_id, access_token_hash, refresh_token_hash, expires_at)
        VALUES ($1, $2, $3, NOW() + ($4 * INTERVAL '1 second'))
        RETURNING expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );

    for _ in 0..3 {
        let access_token = generate_session_token()?;
        let refresh_token = generate_session_token()?;
        let result = sqlx::query(query)
            .bind(account_id)
            .bind(hash_session_token(&access_token))
            .bind(hash_session_token(&refresh_token))
            .bind(ttl_seconds)
            .fetch_one(pool)
            .instrument(span.clone())
            .await;

        match result {
            Ok(row) => {
                return Ok(SessionTokens {
                    access_token,
                    refresh_token,
                    expires_at: row.get("expires_at"),
                });
            }
            Err(err) if is_unique_violation(&err) => {}
            Err(err) => return Err(err).context("failed to insert session"),
        }
    }

    Err(anyhow!("failed to generate unique session tokens"))
}

/// Resolve an access-token hash to its session, if still valid.
pub(super) async fn lookup_session(
    pool: &PgPool,
    access_token_hash: &[u8],
) -> Result<Option<SessionRecord>> {
    // Only unexpired sessions resolve; hard expiry needs no cleanup here.
    let query = r"
        SELECT accounts.id, accounts.email, accounts.role::text AS role,
               account_sessions.expires_at
        FROM account_sessions
        JOIN accounts ON accounts.id = account_sessions.account_id
        WHERE account_sessions.access_token_hash = $1
          AND account_sessions.expires_at > NOW()
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(access_token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup session")?;

    let Some(row) = row else {
        return Ok(None);
    };

    // Record activity for audit/visibility without extending the session TTL.
    let query = r"
        UPDATE account_sessions
        SET last_seen_at = NOW()
        WHERE access_token_hash = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(access_token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update session last_seen_at")?;

    Ok(Some(SessionRecord {
        account_id: row.get("id"),
        email: row.get("email"),
        role: row.get("role"),
        expires_at: row.get("expires_at"),
    }))
}

/// Rotate a session identified by its refresh-token hash: new token pair, new
/// expiry, same owning account. Returns `None` for unknown or expired tokens.
pub(super) async fn refresh_session(
    pool: &PgPool,
    refresh_token_hash: &[u8],
    ttl_seconds: i64,
) -> Result<Option<SessionTokens>> {
    let query = r"
        UPDATE account_sessions
        SET access_token_hash = $2,
            refresh_token_hash = $3,
            expires_at = NOW() + ($4 * INTERVAL '1 second'),
            last_seen_at = NOW()
        WHERE refresh_token_hash = $1
          AND expires_at > NOW()
        RETURNING expires_at
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );

    let access_token = generate_session_token()?;
    let refresh_token = generate_session_token()?;
    let row = sqlx::query(query)
        .bind(refresh_token_hash)
        .bind(hash_session_token(&access_token))
        .bind(hash_session_token(&refresh_token))
        .bind(ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to refresh session")?;

    Ok(row.map(|row| SessionTokens {
        access_token,
        refresh_token,
        expires_at: row.get("expires_at"),
    }))
}

/// Delete a session by its access-token hash. Idempotent; sign-out is fine
/// with zero rows deleted.
pub(super) async fn delete_session(pool: &PgPool, access_token_hash: &[u8]) -> Result<()> {
    let query = "DELETE FROM account_sessions WHERE access_token_hash = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(access_token_hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete session")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_outcome_debug_names() {
        assert_eq!(
            format!("{:?}", RegisterOutcome::Created(Uuid::nil())),
            format!("Created({:?})", Uuid::nil())
        );
        assert_eq!(format!("{:?}", RegisterOutcome::Conflict), "Conflict");
    }

    #[test]
    fn session_record_holds_values() {
        let now = Utc::now();
        let record = SessionRecord {
            account_id: Uuid::nil(),
            email: "a@b.co".to_string(),
            role: "cliente".to_string(),
            expires_at: now,
        };
        assert_eq!(record.account_id, Uuid::nil());
        assert_eq!(record.email, "a@b.co");
        assert_eq!(record.role, "cliente");
        assert_eq!(record.expires_at, now);
    }
}
