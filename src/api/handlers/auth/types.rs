//! Request/response types for auth endpoints.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::LoginArea;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Login form the submission came from; gates which roles may proceed.
    pub area: Option<LoginArea>,
    /// Page to return to after login, honored only if the role may access it.
    pub return_to: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub redirect: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub telegram_username: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub account_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub account_id: String,
    pub email: String,
    pub role: String,
    pub expires_at: DateTime<Utc>,
}

/// Single user-facing error message.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub(super) fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Field-keyed validation errors, rendered inline by forms.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct FieldErrorResponse {
    pub errors: BTreeMap<String, String>,
}

impl FieldErrorResponse {
    pub(super) fn from_fields(fields: BTreeMap<&'static str, &'static str>) -> Self {
        Self {
            errors: fields
                .into_iter()
                .map(|(field, message)| (field.to_string(), message.to_string()))
                .collect(),
        }
    }
}
