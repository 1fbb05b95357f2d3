//! Account roles, landing-page mapping, and path access gates.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role attached to every account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Master,
    Admin,
    Tipster,
    Cliente,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Admin => "admin",
            Self::Tipster => "tipster",
            Self::Cliente => "cliente",
        }
    }

    /// Parse the database representation. The `account_role` enum makes other
    /// values unreachable; callers treat `None` as a logged error condition.
    #[must_use]
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "master" => Some(Self::Master),
            "admin" => Some(Self::Admin),
            "tipster" => Some(Self::Tipster),
            "cliente" => Some(Self::Cliente),
            _ => None,
        }
    }

    /// Default landing page after login.
    #[must_use]
    pub fn redirect_path(self) -> &'static str {
        match self {
            Self::Master | Self::Admin => "/admin",
            Self::Tipster => "/meus-canais",
            Self::Cliente => "/dashboard",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path prefixes that require a specific role. Paths matching none of these
/// prefixes are public.
const PROTECTED_PREFIXES: [(&str, &[Role]); 3] = [
    ("/admin", &[Role::Master, Role::Admin]),
    ("/meus-canais", &[Role::Tipster]),
    ("/dashboard", &[Role::Cliente]),
];

#[must_use]
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .any(|(prefix, _)| path.starts_with(prefix))
}

/// Whether `role` may access `path`. Public paths are allowed for everyone.
#[must_use]
pub fn can_access(role: Role, path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .find(|(prefix, _)| path.starts_with(prefix))
        .map_or(true, |(_, allowed)| allowed.contains(&role))
}

/// Login area presented by the client. Each area only admits certain roles,
/// so an admin cannot sign in through the tipster form and vice versa.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoginArea {
    Client,
    Tipster,
    Admin,
}

impl LoginArea {
    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        match self {
            Self::Admin => matches!(role, Role::Master | Role::Admin),
            Self::Tipster => role == Role::Tipster,
            Self::Client => role == Role::Cliente,
        }
    }
}

/// Post-login destination: a requested return URL is honored only when the
/// role may actually access it, otherwise the role's landing page wins.
#[must_use]
pub fn post_login_redirect(role: Role, return_to: Option<&str>) -> String {
    match return_to {
        Some(path) if path.starts_with('/') && can_access(role, path) => path.to_string(),
        _ => role.redirect_path().to_string(),
    }
}
