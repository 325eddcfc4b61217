#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email already in use")]
    EmailInUse,
    #[error("invalid email")]
    InvalidEmail,
    #[error("password shorter than 6 characters")]
    WeakPassword,
    #[error("auth provider error: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Maps an Identity Toolkit error message (or a client SDK code) to the taxonomy.
    pub fn from_provider_code(code: &str) -> Self {
        // Identity Toolkit appends details after " : ", e.g. "WEAK_PASSWORD : Password should be ..."
        let head = code.split(" : ").next().unwrap_or(code).trim();
        match head {
            "EMAIL_EXISTS" | "auth/email-already-in-use" => AuthError::EmailInUse,
            "INVALID_EMAIL" | "auth/invalid-email" => AuthError::InvalidEmail,
            "WEAK_PASSWORD" | "auth/weak-password" => AuthError::WeakPassword,
            other => AuthError::Unknown(other.to_string()),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::EmailInUse => "Este email já está em uso",
            AuthError::InvalidEmail => "Email inválido",
            AuthError::WeakPassword => "A senha deve ter pelo menos 6 caracteres",
            AuthError::Unknown(_) => "Ocorreu um erro ao criar a conta",
        }
    }
}
