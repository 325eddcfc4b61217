use anyhow::{Context, Result};
use std::env;
use tracing::info;

pub const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

const REQUIRED: [&str; 3] = ["TMDB_API_KEY", "FIREBASE_API_KEY", "FIREBASE_PROJECT_ID"];

pub fn check_env() -> Result<()> {
    for key in REQUIRED {
        if env::var(key).map(|v| v.is_empty()).unwrap_or(true) {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    info!("All required environment variables are set");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_url: String,
    pub firestore_url: String,
}

impl FirebaseConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_url: IDENTITY_TOOLKIT_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("FIREBASE_API_KEY").context("FIREBASE_API_KEY not set")?;
        let project_id = env::var("FIREBASE_PROJECT_ID").context("FIREBASE_PROJECT_ID not set")?;
        let mut config = Self::new(api_key, project_id);
        if let Some(url) = optional("FIREBASE_AUTH_URL") {
            config.auth_url = url;
        }
        if let Some(url) = optional("FIRESTORE_URL") {
            config.firestore_url = url;
        }
        Ok(config)
    }

    pub fn documents_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.firestore_url.trim_end_matches('/'),
            self.project_id
        )
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}
