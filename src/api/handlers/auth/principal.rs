//! Authenticated principal extraction and authorization helpers.
//!
//! Flow Overview: read the session cookie, resolve it to an account, and
//! return a principal that downstream handlers can use. Path authorization is
//! decided against the fixed role tables in `roles`.

use axum::http::{HeaderMap, StatusCode};
use sqlx::PgPool;
use tracing::error;

use super::errors::access_denied_message;
use super::roles::{Role, can_access};
use super::session::authenticate_session;

/// Authenticated account context derived from the session cookie.
#[derive(Clone, Debug)]
pub struct Principal {
    pub account_id: uuid::Uuid,
    pub email: String,
    pub role: Role,
}

/// Resolve a session cookie into a principal, or return 401 for missing sessions.
pub async fn require_auth(headers: &HeaderMap, pool: &PgPool) -> Result<Principal, StatusCode> {
    match authenticate_session(headers, pool).await {
        Ok(Some(record)) => match Role::from_db(&record.role) {
            Some(role) => Ok(Principal {
                account_id: record.account_id,
                email: record.email,
                role,
            }),
            None => {
                error!(identifier = %record.email, role = %record.role, "account has unknown role");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
        },
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(status) => Err(status),
    }
}

/// Gate a protected path for an already-authenticated principal.
///
/// # Errors
/// Returns 403 with the area's access-denied message when the role may not
/// enter the path.
pub fn authorize(principal: &Principal, path: &str) -> Result<(), (StatusCode, &'static str)> {
    if can_access(principal.role, path) {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, access_denied_message(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(role: Role) -> Principal {
        Principal {
            account_id: Uuid::nil(),
            email: "a@b.co".to_string(),
            role,
        }
    }

    #[test]
    fn authorize_follows_access_table() {
        assert!(authorize(&principal(Role::Admin), "/admin").is_ok());
        assert!(authorize(&principal(Role::Tipster), "/meus-canais").is_ok());
        assert!(authorize(&principal(Role::Cliente), "/dashboard").is_ok());

        let denied = authorize(&principal(Role::Tipster), "/admin");
        assert_eq!(
            denied,
            Err((StatusCode::FORBIDDEN, "Acesso negado. Área administrativa."))
        );
    }

    #[test]
    fn authorize_allows_public_paths() {
        assert!(authorize(&principal(Role::Cliente), "/canais").is_ok());
    }

    #[tokio::test]
    async fn require_auth_without_cookie_is_unauthorized() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://betlink@localhost/betlink")
            .expect("lazy pool");
        let result = require_auth(&HeaderMap::new(), &pool).await;
        assert_eq!(result.err(), Some(StatusCode::UNAUTHORIZED));
    }
}
