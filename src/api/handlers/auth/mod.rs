//! Auth handlers and supporting modules.
//!
//! This module coordinates login, registration, session management, and the
//! role-based routing tables.
//!
//! ## Login flow
//!
//! A submission passes, in order: local field validation (no database
//! access), the per-account rate limiter, the privileged password check, the
//! login-area gate, and session establishment. Failures answer with the fixed
//! Portuguese vocabulary and never reveal whether an email is registered.
//!
//! ## Lockout
//!
//! - **Attempt Limit:** 5 cumulative failures lock the account.
//! - **Lockout Window:** 15 minutes, cleared lazily once elapsed.
//!
//! The limiter fails open when the database is unreachable; availability wins
//! over strict lockout accuracy.

pub(crate) mod errors;
pub mod events;
pub(crate) mod login;
pub mod monitor;
pub(crate) mod principal;
mod rate_limit;
pub(crate) mod register;
pub(crate) mod roles;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
mod validate;
mod verify;

pub use login::login;
pub use rate_limit::{RateLimitDecision, clear_expired_locks};
pub use register::register;
pub use state::{AuthConfig, AuthState};
