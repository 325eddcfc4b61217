use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::watch;

mod client;
mod document;
mod error;

pub use client::FirebaseClient;
pub use error::AuthError;

use crate::models::{ProfileFields, Session, UserProfile};

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Creates the credential, then the profile document. The two steps are not
    /// atomic: a failed document write leaves the credential in place.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> Result<UserProfile, AuthError>;
    async fn sign_in(&self, email: &str, password: &str)
        -> Result<Session, AuthError>;
    async fn sign_out(&self) -> Result<()>;
    /// `Ok(None)` when the subject has no profile document yet.
    async fn get_profile(&self, subject: &str) -> Result<Option<UserProfile>>;
    async fn update_profile(&self, subject: &str, fields: ProfileFields) -> Result<()>;
    fn current_session(&self) -> Option<Session>;
    /// Session changes, `None` meaning signed out.
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;
}

#[async_trait]
impl AccountStore for FirebaseClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> Result<UserProfile, AuthError> {
        self.create_account(email, password, fields).await
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.sign_in_with_password(email, password).await
    }

    async fn sign_out(&self) -> Result<()> {
        self.clear_session("signed out");
        Ok(())
    }

    async fn get_profile(&self, subject: &str) -> Result<Option<UserProfile>> {
        self.fetch_profile(subject).await
    }

    async fn update_profile(&self, subject: &str, fields: ProfileFields) -> Result<()> {
        self.patch_profile(subject, &fields).await
    }

    fn current_session(&self) -> Option<Session> {
        self.session()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_events()
    }
}
