//! Which screens are reachable, derived from the account store's session channel.
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::models::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    SignIn,
    SignUp,
    SuggestionsHome,
    Profile,
}

const SIGNED_OUT_SCREENS: &[Screen] = &[Screen::SignIn, Screen::SignUp];
const SIGNED_IN_SCREENS: &[Screen] = &[Screen::SuggestionsHome, Screen::Profile];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated { subject: String },
}

impl AuthState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(s) if !s.subject.is_empty() => AuthState::Authenticated {
                subject: s.subject.clone(),
            },
            _ => AuthState::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn reachable_screens(&self) -> &'static [Screen] {
        match self {
            AuthState::Unauthenticated => SIGNED_OUT_SCREENS,
            AuthState::Authenticated { .. } => SIGNED_IN_SCREENS,
        }
    }

    /// First screen of the group, shown when the root switches.
    pub fn root(&self) -> Screen {
        self.reachable_screens()[0]
    }
}

/// Passive observer of session changes. Subscribes on [`attach`](Self::attach)
/// and stops listening on [`detach`](Self::detach) or drop.
pub struct NavigationPolicy {
    state: watch::Receiver<AuthState>,
    listener: Option<JoinHandle<()>>,
}

impl NavigationPolicy {
    /// Must be called inside a tokio runtime.
    pub fn attach(mut sessions: watch::Receiver<Option<Session>>) -> Self {
        let initial = AuthState::from_session(sessions.borrow_and_update().as_ref());
        let (tx, state) = watch::channel(initial);

        let listener = tokio::spawn(async move {
            while sessions.changed().await.is_ok() {
                let next = AuthState::from_session(sessions.borrow_and_update().as_ref());
                tx.send_if_modified(|current| {
                    if *current == next {
                        return false;
                    }
                    info!(
                        "Navigation root switched to {:?}",
                        next.root()
                    );
                    *current = next;
                    true
                });
            }
            debug!("Session channel closed, navigation policy stops listening");
        });

        Self {
            state,
            listener: Some(listener),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn reachable_screens(&self) -> &'static [Screen] {
        self.state.borrow().reachable_screens()
    }

    pub fn can_visit(&self, screen: Screen) -> bool {
        self.reachable_screens().contains(&screen)
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    pub fn detach(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            debug!("Navigation policy detached");
        }
    }
}

impl Drop for NavigationPolicy {
    fn drop(&mut self) {
        self.detach();
    }
}
