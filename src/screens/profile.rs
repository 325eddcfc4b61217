use std::sync::Arc;
use tracing::{error, warn};

use crate::account::AccountStore;
use crate::models::{ProfileFields, UserProfile};

pub const PROFILE_SAVED: &str = "Perfil atualizado com sucesso!";
pub const PROFILE_SAVE_FAILED: &str = "Não foi possível atualizar seu perfil";
pub const PROFILE_LOAD_FAILED: &str = "Não foi possível carregar seus dados";
pub const SIGN_OUT_FAILED: &str = "Não foi possível fazer logout";

/// Editable copy of the signed-in user's profile.
pub struct ProfileScreen {
    store: Arc<dyn AccountStore>,
    profile: UserProfile,
    editing: bool,
    message: Option<String>,
}

impl ProfileScreen {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self {
            store,
            profile: UserProfile::default(),
            editing: false,
            message: None,
        }
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Local edits. Only name, phone and address are ever saved.
    pub fn profile_mut(&mut self) -> &mut UserProfile {
        &mut self.profile
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn take_message(&mut self) -> Option<String> {
        self.message.take()
    }

    pub async fn load(&mut self) {
        let Some(session) = self.store.current_session() else {
            warn!("Profile requested without a session");
            self.message = Some(PROFILE_LOAD_FAILED.to_string());
            return;
        };
        match self.store.get_profile(&session.subject).await {
            Ok(Some(profile)) => self.profile = profile,
            // No document yet: keep the empty form.
            Ok(None) => {}
            Err(e) => {
                error!("Failed to load profile: {:#}", e);
                self.message = Some(PROFILE_LOAD_FAILED.to_string());
            }
        }
    }

    pub fn start_editing(&mut self) {
        self.editing = true;
    }

    pub async fn save(&mut self) -> bool {
        let Some(session) = self.store.current_session() else {
            self.message = Some(PROFILE_SAVE_FAILED.to_string());
            return false;
        };
        let fields = ProfileFields::from(&self.profile);
        match self.store.update_profile(&session.subject, fields).await {
            Ok(()) => {
                self.message = Some(PROFILE_SAVED.to_string());
                self.editing = false;
                true
            }
            Err(e) => {
                error!("Failed to update profile: {:#}", e);
                self.message = Some(PROFILE_SAVE_FAILED.to_string());
                false
            }
        }
    }

    /// Drops local edits by reloading the stored profile.
    pub async fn cancel(&mut self) {
        self.editing = false;
        self.load().await;
    }

    pub async fn sign_out(&mut self) -> bool {
        match self.store.sign_out().await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to sign out: {:#}", e);
                self.message = Some(SIGN_OUT_FAILED.to_string());
                false
            }
        }
    }
}
