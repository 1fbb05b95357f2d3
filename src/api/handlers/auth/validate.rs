//! Local credential validation.
//!
//! Runs before any database access: a submission that fails here never
//! reaches the rate limiter or the password check. Errors are keyed by field
//! name so forms can render them inline.
//!
//! Password policy: minimum 8 characters everywhere; registration also
//! requires at least one letter and one digit, since complexity can only be
//! demanded when a password is chosen.

use std::collections::BTreeMap;

use super::errors::{
    MSG_EMAIL_INVALID, MSG_EMAIL_REQUIRED, MSG_NAME_REQUIRED, MSG_PASSWORD_REQUIRED,
    MSG_PASSWORD_TOO_SHORT, MSG_PASSWORD_TOO_WEAK, MSG_PHONE_INVALID, MSG_TELEGRAM_INVALID,
};
use super::types::RegisterRequest;
use super::utils::{valid_email, valid_phone, valid_telegram_username};

pub(super) const PASSWORD_MIN_LEN: usize = 8;

/// Field-level errors, empty when the submission passes local validation.
pub(super) type FieldErrors = BTreeMap<&'static str, &'static str>;

/// Validate a login submission. `email` must already be normalized.
pub(super) fn validate_login(email: &str, password: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if email.is_empty() {
        errors.insert("email", MSG_EMAIL_REQUIRED);
    } else if !valid_email(email) {
        errors.insert("email", MSG_EMAIL_INVALID);
    }

    if password.is_empty() {
        errors.insert("password", MSG_PASSWORD_REQUIRED);
    } else if password.len() < PASSWORD_MIN_LEN {
        errors.insert("password", MSG_PASSWORD_TOO_SHORT);
    }

    errors
}

/// Validate a registration submission (stricter path). `email` must already
/// be normalized.
pub(super) fn validate_registration(email: &str, request: &RegisterRequest) -> FieldErrors {
    let mut errors = validate_login(email, &request.password);

    if !errors.contains_key("password") && !password_has_complexity(&request.password) {
        errors.insert("password", MSG_PASSWORD_TOO_WEAK);
    }

    if request.name.trim().is_empty() {
        errors.insert("name", MSG_NAME_REQUIRED);
    }

    if let Some(phone) = request.phone.as_deref() {
        if !valid_phone(phone) {
            errors.insert("phone", MSG_PHONE_INVALID);
        }
    }

    if let Some(username) = request.telegram_username.as_deref() {
        if !valid_telegram_username(username) {
            errors.insert("telegram_username", MSG_TELEGRAM_INVALID);
        }
    }

    errors
}

fn password_has_complexity(password: &str) -> bool {
    password.chars().any(char::is_alphabetic) && password.chars().any(|c| c.is_ascii_digit())
}
