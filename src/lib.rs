//! # BetLink Auth Service
//!
//! `betlink` is the authentication and session authority for the BetLink
//! tipster marketplace. It handles password login with per-account lockout,
//! session management, and role-based routing.
//!
//! ## Roles & Routing
//!
//! Every account carries one of four roles: `master`, `admin`, `tipster`, or
//! `cliente`. Each role has a fixed landing page after login, and protected
//! path prefixes (`/admin`, `/meus-canais`, `/dashboard`) only admit the
//! roles in their table. Paths matching no prefix are public.
//!
//! ## Login & Lockout
//!
//! Submissions are validated locally before any database access, then checked
//! against a per-account rate limiter: five cumulative failures lock the
//! account for 15 minutes, with elapsed locks cleared lazily. Password
//! comparison happens inside a privileged `PostgreSQL` function, so the
//! application tier never holds a credential hash. Unknown emails and wrong
//! passwords are deliberately indistinguishable in responses.
//!
//! ## Sessions
//!
//! Logins produce an access/refresh token pair stored only as hashes and
//! delivered as `HttpOnly`, same-site cookies. Sessions close to expiry are
//! rotated before a navigation is served; clients can also watch expiry with
//! the cancelable session monitor.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
