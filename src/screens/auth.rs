use std::sync::Arc;
use tracing::info;

use crate::account::{AccountStore, AuthError};
use crate::models::{ProfileFields, UserProfile};

pub const MISSING_FIELDS: &str = "Por favor, preencha todos os campos obrigatórios";
pub const PASSWORD_MISMATCH: &str = "As senhas não coincidem";
pub const ACCOUNT_CREATED: &str = "Conta criada com sucesso!";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone: String,
    pub address: String,
}

impl SignUpForm {
    /// Presence checks only; the provider validates email and password strength.
    pub fn validate(&self) -> Result<ProfileFields, &'static str> {
        let required = [&self.name, &self.email, &self.password, &self.confirm_password];
        if required.iter().any(|v| v.is_empty()) {
            return Err(MISSING_FIELDS);
        }
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH);
        }
        Ok(ProfileFields {
            name: self.name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        })
    }

    /// Parses `name;email;password;confirm;phone;address`. Phone and address may be left off.
    pub fn parse(input: &str) -> Self {
        let mut parts = input.split(';').map(|p| p.trim().to_string());
        let mut next = || parts.next().unwrap_or_default();
        Self {
            name: next(),
            email: next(),
            password: next(),
            confirm_password: next(),
            phone: next(),
            address: next(),
        }
    }

    pub async fn submit(&self, store: &Arc<dyn AccountStore>) -> Result<UserProfile, String> {
        let fields = self.validate().map_err(str::to_string)?;
        let profile = store
            .sign_up(&self.email, &self.password, fields)
            .await
            .map_err(|e| e.user_message().to_string())?;
        info!("Registered subject {}", profile.id);
        Ok(profile)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl SignInForm {
    pub async fn submit(&self, store: &Arc<dyn AccountStore>) -> Result<(), String> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(MISSING_FIELDS.to_string());
        }
        store
            .sign_in(&self.email, &self.password)
            .await
            .map(|_| ())
            .map_err(|e| sign_in_message(&e).to_string())
    }
}

fn sign_in_message(error: &AuthError) -> &'static str {
    match error {
        AuthError::InvalidEmail => error.user_message(),
        _ => "Email ou senha incorretos",
    }
}
