//! Password verification behind the database trust boundary.
//!
//! The plaintext password is handed to the privileged SQL function
//! `verify_account_password`, which compares it against the stored hash
//! inside Postgres and returns at most the account id and role. The
//! application tier never reads a hash, and an unknown email is
//! indistinguishable from a wrong password (both return zero rows).

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

/// Account identity returned by a successful verification.
#[derive(Clone, Debug)]
pub(super) struct VerifiedAccount {
    pub(super) account_id: Uuid,
    pub(super) role: String,
}

/// Verify `password` for `email`. `Ok(None)` covers both unknown accounts
/// and wrong passwords.
pub(super) async fn verify_credentials(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<Option<VerifiedAccount>> {
    let query = "SELECT account_id, account_role FROM verify_account_password($1, $2)";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to verify credentials")?;

    Ok(row.map(|row| VerifiedAccount {
        account_id: row.get("account_id"),
        role: row.get("account_role"),
    }))
}
