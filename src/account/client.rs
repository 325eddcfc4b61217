use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::document::{self, Document, COLLECTION};
use super::AuthError;
use crate::config::FirebaseConfig;
use crate::models::{ProfileFields, Session, UserProfile};

/// Identity Toolkit + Firestore over REST. Holds the signed-in session and
/// publishes every change of it on a watch channel.
#[derive(Debug)]
pub struct FirebaseClient {
    client: Client,
    api_key: String,
    auth_url: String,
    documents_url: String,
    session: watch::Sender<Option<Session>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct IdentityErrorBody {
    error: IdentityError,
}

#[derive(Debug, Deserialize)]
struct IdentityError {
    message: String,
}

impl FirebaseClient {
    pub fn new(config: FirebaseConfig) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            client: Client::new(),
            documents_url: config.documents_url(),
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            session,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(FirebaseConfig::from_env()?))
    }

    pub(crate) fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    pub(crate) fn session_events(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    pub(crate) fn clear_session(&self, reason: &str) {
        if self.session.send_if_modified(|s| s.take().is_some()) {
            info!("Session ended: {}", reason);
        }
    }

    fn publish(&self, session: Session) {
        debug!("Publishing session for subject {}", session.subject);
        self.session.send_replace(Some(session));
    }

    pub(crate) async fn create_account(
        &self,
        email: &str,
        password: &str,
        fields: ProfileFields,
    ) -> Result<UserProfile, AuthError> {
        let session = self
            .identity_request("accounts:signUp", email, password)
            .await?;
        info!("Created credential for subject {}", session.subject);
        // The provider signs new accounts in right away, before the profile exists.
        self.publish(session.clone());

        let profile = UserProfile {
            id: session.subject.clone(),
            name: fields.name,
            email: email.to_string(),
            phone: fields.phone,
            address: fields.address,
            created_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        if let Err(e) = self.write_profile(&session, &profile).await {
            error!(
                "Credential {} created but its profile document was not: {:#}",
                profile.id, e
            );
            return Err(AuthError::Unknown(format!("PROFILE_WRITE_FAILED: {e}")));
        }
        info!("Stored profile document for subject {}", profile.id);
        Ok(profile)
    }

    pub(crate) async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self
            .identity_request("accounts:signInWithPassword", email, password)
            .await?;
        info!("Signed in subject {}", session.subject);
        self.publish(session.clone());
        Ok(session)
    }

    pub(crate) async fn fetch_profile(&self, subject: &str) -> Result<Option<UserProfile>> {
        let session = self.signed_in()?;
        let request = self
            .client
            .get(self.document_url(subject))
            .bearer_auth(&session.id_token);
        let Some(res) = self.send_document(request, "profile read").await? else {
            debug!("No profile document for subject {}", subject);
            return Ok(None);
        };
        let doc: Document = res.json().await.context("profile JSON parse failed")?;
        Ok(Some(doc.into_profile(subject)))
    }

    pub(crate) async fn patch_profile(&self, subject: &str, fields: &ProfileFields) -> Result<()> {
        let session = self.signed_in()?;
        let url = format!(
            "{}?{}",
            self.document_url(subject),
            document::update_mask_query()
        );
        let request = self
            .client
            .patch(url)
            .bearer_auth(&session.id_token)
            .json(&document::update_document(fields));
        self.send_document(request, "profile update")
            .await?
            .ok_or_else(|| anyhow!("no profile document for subject {}", subject))?;
        info!("Updated profile for subject {}", subject);
        Ok(())
    }

    async fn write_profile(&self, session: &Session, profile: &UserProfile) -> Result<()> {
        let request = self
            .client
            .patch(self.document_url(&profile.id))
            .bearer_auth(&session.id_token)
            .json(&document::profile_document(profile));
        self.send_document(request, "profile write")
            .await?
            .ok_or_else(|| anyhow!("profile write returned not found"))?;
        Ok(())
    }

    /// `Ok(None)` on 404. A 401 ends the local session.
    async fn send_document(&self, request: RequestBuilder, what: &str) -> Result<Option<Response>> {
        let res = request
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("{what} request failed"))?;
        match res.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED => {
                warn!("{} rejected the session token", what);
                self.clear_session("token rejected by document store");
                Err(anyhow!("{what} failed: session is no longer valid"))
            }
            status if !status.is_success() => {
                let text = res.text().await.unwrap_or_default();
                Err(anyhow!("{what} failed (status {status}): {text}"))
            }
            _ => Ok(Some(res)),
        }
    }

    async fn identity_request(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/{action}?key={}", self.auth_url, self.api_key);
        let body = json!({
            "email": email,
            "password": password,
            "returnSecureToken": true
        });
        let res = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Identity Toolkit {} request failed: {}", action, e.without_url());
                AuthError::Unknown("NETWORK_REQUEST_FAILED".to_string())
            })?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|_| AuthError::Unknown("NETWORK_REQUEST_FAILED".to_string()))?;
        if !status.is_success() {
            let code = serde_json::from_str::<IdentityErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("HTTP_{}", status.as_u16()));
            warn!("Identity Toolkit {} rejected: {}", action, code);
            return Err(AuthError::from_provider_code(&code));
        }
        let parsed: IdentityResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::Unknown(format!("MALFORMED_RESPONSE: {e}")))?;
        Ok(Session {
            subject: parsed.local_id,
            email: parsed.email.unwrap_or_else(|| email.to_string()),
            id_token: parsed.id_token,
            refresh_token: parsed.refresh_token,
        })
    }

    fn signed_in(&self) -> Result<Session> {
        self.session().ok_or_else(|| anyhow!("not signed in"))
    }

    fn document_url(&self, subject: &str) -> String {
        format!(
            "{}/{COLLECTION}/{}",
            self.documents_url,
            urlencoding::encode(subject)
        )
    }
}
