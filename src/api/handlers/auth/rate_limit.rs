//! Database-backed login rate limiting.
//!
//! Flow Overview:
//! 1) Track a failed-attempt counter and lockout expiry per account.
//! 2) Five cumulative failures lock the account for 15 minutes.
//! 3) Elapsed lockouts are cleared lazily on the next check.
//!
//! The failure path is a single `UPDATE ... RETURNING` so two concurrent
//! failures cannot both observe the same counter value. Availability wins
//! over strict accuracy: `check` fails open when the database is unreachable,
//! and bookkeeping writes only log their errors.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{Instrument, error, warn};
use uuid::Uuid;

pub(super) const MAX_FAILED_ATTEMPTS: i32 = 5;
pub(super) const LOCKOUT_MINUTES: i64 = 15;

/// Outcome of a pre-verification rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    Locked { minutes_remaining: i64 },
}

/// State returned after recording a failed verification.
#[derive(Clone, Copy, Debug)]
pub(super) struct FailureRecord {
    pub(super) attempts: i32,
    pub(super) locked: bool,
}

/// Check whether `email` may attempt a login right now.
///
/// Elapsed lockouts are cleared (attempts included) before allowing. Unknown
/// emails are allowed through; the password check fails generically for them.
/// Persistence errors also allow (fail open) and are logged.
pub(super) async fn check(pool: &PgPool, email: &str) -> RateLimitDecision {
    match load_state(pool, email).await {
        Ok(Some(state)) => evaluate(pool, email, state).await,
        Ok(None) => RateLimitDecision::Allow,
        Err(err) => {
            error!(operation = "rate_limit.check", identifier = %email, "failed to read lockout state: {err:#}");
            RateLimitDecision::Allow
        }
    }
}

async fn evaluate(pool: &PgPool, email: &str, state: LimitState) -> RateLimitDecision {
    let now = Utc::now();

    if let Some(locked_until) = state.locked_until {
        if locked_until > now {
            return RateLimitDecision::Locked {
                minutes_remaining: minutes_remaining(locked_until, now),
            };
        }
        // Lock elapsed: clear it and the counter before evaluating anything else.
        if let Err(err) = clear_lock(pool, email).await {
            warn!(operation = "rate_limit.clear", identifier = %email, "failed to clear elapsed lockout: {err:#}");
        }
        return RateLimitDecision::Allow;
    }

    if state.attempts >= MAX_FAILED_ATTEMPTS {
        // Counter at threshold without an active lock: lock now.
        if let Err(err) = apply_lock(pool, email).await {
            error!(operation = "rate_limit.lock", identifier = %email, "failed to lock account: {err:#}");
        }
        return RateLimitDecision::Locked {
            minutes_remaining: LOCKOUT_MINUTES,
        };
    }

    RateLimitDecision::Allow
}

/// Record a failed password verification.
///
/// The increment and the conditional lockout happen in one statement; the
/// returned state tells the caller whether this failure tripped the lock.
/// Errors are logged and swallowed so bookkeeping never blocks the flow.
pub(super) async fn record_failure(pool: &PgPool, email: &str) -> Option<FailureRecord> {
    let query = r"
        UPDATE accounts
        SET login_attempts = login_attempts + 1,
            locked_until = CASE
                WHEN login_attempts + 1 >= $2
                    THEN NOW() + ($3 * INTERVAL '1 minute')
                ELSE locked_until
            END,
            updated_at = NOW()
        WHERE email = $1
        RETURNING login_attempts,
                  locked_until IS NOT NULL AND locked_until > NOW() AS locked
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(MAX_FAILED_ATTEMPTS)
        .bind(LOCKOUT_MINUTES)
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match row {
        Ok(Some(row)) => Some(FailureRecord {
            attempts: row.get("login_attempts"),
            locked: row.get("locked"),
        }),
        Ok(None) => None,
        Err(err) => {
            error!(operation = "rate_limit.increment", identifier = %email, "failed to record login failure: {err:#}");
            None
        }
    }
}

/// Reset the counter, clear any lock, and stamp the last successful login.
/// Errors are logged and swallowed; a login must not fail on bookkeeping.
pub(super) async fn record_success(pool: &PgPool, account_id: Uuid) {
    let query = r"
        UPDATE accounts
        SET login_attempts = 0,
            locked_until = NULL,
            last_login_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    if let Err(err) = sqlx::query(query)
        .bind(account_id)
        .execute(pool)
        .instrument(span)
        .await
    {
        error!(operation = "rate_limit.reset", identifier = %account_id, "failed to reset login attempts: {err:#}");
    }
}

/// Maintenance sweep clearing every elapsed lockout in one statement.
pub async fn clear_expired_locks(pool: &PgPool) -> Result<u64> {
    let query = r"
        UPDATE accounts
        SET login_attempts = 0,
            locked_until = NULL,
            updated_at = NOW()
        WHERE locked_until IS NOT NULL
          AND locked_until < NOW()
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear expired lockouts")?;
    Ok(result.rows_affected())
}

struct LimitState {
    attempts: i32,
    locked_until: Option<DateTime<Utc>>,
}

async fn load_state(pool: &PgPool, email: &str) -> Result<Option<LimitState>> {
    let query = "SELECT login_attempts, locked_until FROM accounts WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to read lockout state")?;

    Ok(row.map(|row| LimitState {
        attempts: row.get("login_attempts"),
        locked_until: row.get("locked_until"),
    }))
}

async fn clear_lock(pool: &PgPool, email: &str) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET login_attempts = 0,
            locked_until = NULL,
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear lockout")?;
    Ok(())
}

async fn apply_lock(pool: &PgPool, email: &str) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET login_attempts = $2,
            locked_until = NOW() + ($3 * INTERVAL '1 minute'),
            updated_at = NOW()
        WHERE email = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(email)
        .bind(MAX_FAILED_ATTEMPTS)
        .bind(LOCKOUT_MINUTES)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to lock account")?;
    Ok(())
}

fn minutes_remaining(locked_until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (locked_until - now).num_seconds().max(0);
    (seconds as u64).div_ceil(60) as i64
}
