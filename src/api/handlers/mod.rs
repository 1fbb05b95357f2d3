//! API handlers for BetLink.
//!
//! This module organizes the service's route handlers: the auth core (login,
//! registration, sessions, role routing), the current-account and
//! administration endpoints, and the undocumented root/health plumbing.

pub mod accounts;
pub mod auth;
pub mod health;
pub mod me;
pub mod root;
