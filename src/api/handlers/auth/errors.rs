//! User-facing error vocabulary.
//!
//! Every internal status maps to a fixed Portuguese message. The credential
//! messages never reveal whether an email is registered, and raw provider or
//! database error text never reaches the client; it is logged server-side at
//! the handler boundary instead.

pub const MSG_INVALID_CREDENTIALS: &str = "Email ou senha incorretos";
pub const MSG_ACCOUNT_LOCKED_NOW: &str = "Muitas tentativas. Conta bloqueada por 15 minutos.";
pub const MSG_WRONG_AREA: &str = "Use a área de login correta para seu tipo de usuário";
pub const MSG_SERVER_ERROR: &str = "Erro no servidor. Tente novamente";
pub const MSG_SESSION_INVALID: &str = "Sessão inválida. Faça login novamente";
pub const MSG_INVALID_REQUEST: &str = "Requisição inválida. Tente novamente";
pub const MSG_EMAIL_TAKEN: &str = "Este email já está cadastrado";

pub const MSG_EMAIL_REQUIRED: &str = "Email é obrigatório";
pub const MSG_EMAIL_INVALID: &str = "Email inválido";
pub const MSG_PASSWORD_REQUIRED: &str = "Senha é obrigatória";
pub const MSG_PASSWORD_TOO_SHORT: &str = "Senha deve ter no mínimo 8 caracteres";
pub const MSG_PASSWORD_TOO_WEAK: &str = "Senha muito fraca. Use letras e números";
pub const MSG_NAME_REQUIRED: &str = "Nome é obrigatório";
pub const MSG_PHONE_INVALID: &str = "Telefone inválido. Use o formato (11) 99999-9999";
pub const MSG_TELEGRAM_INVALID: &str =
    "Username do Telegram inválido (5-32 caracteres, apenas letras, números e _)";

/// Locked-account message with the remaining minutes.
#[must_use]
pub fn msg_locked_minutes(minutes: i64) -> String {
    format!("Conta bloqueada. Tente novamente em {minutes} minutos.")
}

/// Access-denied message for a protected area.
#[must_use]
pub fn access_denied_message(path: &str) -> &'static str {
    if path.starts_with("/admin") {
        "Acesso negado. Área administrativa."
    } else if path.starts_with("/meus-canais") {
        "Acesso negado. Área exclusiva para tipsters."
    } else if path.starts_with("/dashboard") {
        "Acesso negado. Área exclusiva para clientes."
    } else {
        "Acesso negado. Você não tem permissão para acessar esta página."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_message_contains_minutes() {
        assert_eq!(
            msg_locked_minutes(15),
            "Conta bloqueada. Tente novamente em 15 minutos."
        );
        assert_eq!(
            msg_locked_minutes(1),
            "Conta bloqueada. Tente novamente em 1 minutos."
        );
    }

    #[test]
    fn access_denied_message_per_area() {
        assert_eq!(
            access_denied_message("/admin/users"),
            "Acesso negado. Área administrativa."
        );
        assert_eq!(
            access_denied_message("/meus-canais"),
            "Acesso negado. Área exclusiva para tipsters."
        );
        assert_eq!(
            access_denied_message("/dashboard"),
            "Acesso negado. Área exclusiva para clientes."
        );
        assert_eq!(
            access_denied_message("/outro"),
            "Acesso negado. Você não tem permissão para acessar esta página."
        );
    }

    #[test]
    fn credential_message_is_generic() {
        // The same message covers unknown emails and wrong passwords.
        assert!(!MSG_INVALID_CREDENTIALS.contains("não encontrado"));
    }
}
