use serde::{Deserialize, Serialize};

pub const POSTER_BASE: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Movie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub original_language: String,
}

impl Movie {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{POSTER_BASE}{p}"))
    }

    /// TMDB sends `""` instead of null for unreleased titles.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|y| y.chars().all(|c| c.is_ascii_digit()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: Option<String>,
}

/// The mutable subset of a profile: what sign-up collects besides the
/// credential, and the only fields a profile update may touch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileFields {
    pub name: String,
    pub phone: String,
    pub address: String,
}

impl From<&UserProfile> for ProfileFields {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.name.clone(),
            phone: profile.phone.clone(),
            address: profile.address.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("subject", &self.subject)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
