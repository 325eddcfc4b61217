use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

use crate::models::{Genre, Movie};

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
const LANGUAGE: &str = "pt-BR";
const MIN_VOTE_COUNT: u32 = 100;

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search_by_text(&self, query: &str) -> Vec<Movie>;
    async fn discover(&self, query: &DiscoverQuery) -> Vec<Movie>;
    async fn list_genres(&self) -> Vec<Genre>;
}

/// Filters for the discover endpoint. `None` means no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverQuery {
    pub genre: Option<String>,
    pub year: Option<String>,
    pub min_rating: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
        let base_url = env::var("TMDB_BASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| TMDB_BASE.to_string());
        Ok(Self::new(api_key, base_url))
    }

    pub async fn try_search_by_text(&self, query: &str) -> Result<Vec<Movie>> {
        let url = search_url(&self.base_url, &self.api_key, query);
        let data: ResultsPage = self.get_json(&url, "search").await?;
        Ok(data.results.unwrap_or_default())
    }

    pub async fn try_discover(&self, query: &DiscoverQuery) -> Result<Vec<Movie>> {
        let url = discover_url(&self.base_url, &self.api_key, query);
        let data: ResultsPage = self.get_json(&url, "discover").await?;
        Ok(data.results.unwrap_or_default())
    }

    pub async fn try_list_genres(&self) -> Result<Vec<Genre>> {
        let url = genres_url(&self.base_url, &self.api_key);
        let data: GenreList = self.get_json(&url, "genre list").await?;
        Ok(data.genres.unwrap_or_default())
    }

    // `what` labels errors so the api_key in the URL never reaches the logs.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str, what: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.without_url())
            .with_context(|| format!("TMDB {what} request failed"))?;
        let status = res.status();
        let text = res
            .text()
            .await
            .with_context(|| format!("reading TMDB {what} body failed"))?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&text)
                .ok()
                .and_then(|e| e.status_message)
                .unwrap_or(text);
            return Err(anyhow!("TMDB {what} failed (status {status}): {message}"));
        }
        let parsed: T = serde_json::from_str(&text)
            .with_context(|| format!("TMDB {what} JSON parse failed"))?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn search_by_text(&self, query: &str) -> Vec<Movie> {
        match self.try_search_by_text(query).await {
            Ok(movies) => {
                debug!("Search '{}' returned {} movies", query, movies.len());
                movies
            }
            Err(e) => {
                warn!("Movie search for '{}' failed: {:#}", query, e);
                Vec::new()
            }
        }
    }

    async fn discover(&self, query: &DiscoverQuery) -> Vec<Movie> {
        match self.try_discover(query).await {
            Ok(movies) => {
                debug!(?query, "Discover returned {} movies", movies.len());
                movies
            }
            Err(e) => {
                warn!("Movie discover failed: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn list_genres(&self) -> Vec<Genre> {
        match self.try_list_genres().await {
            Ok(genres) => genres,
            Err(e) => {
                warn!("Genre listing failed: {:#}", e);
                Vec::new()
            }
        }
    }
}

pub fn search_url(base: &str, api_key: &str, query: &str) -> String {
    format!(
        "{base}/search/movie?api_key={api_key}&language={LANGUAGE}&query={}&page=1&include_adult=false",
        urlencoding::encode(query)
    )
}

pub fn discover_url(base: &str, api_key: &str, query: &DiscoverQuery) -> String {
    let mut url = format!(
        "{base}/discover/movie?api_key={api_key}&language={LANGUAGE}&sort_by=popularity.desc&include_adult=false"
    );
    if let Some(genre) = query.genre.as_deref().filter(|g| !g.is_empty()) {
        url.push_str(&format!("&with_genres={}", urlencoding::encode(genre)));
    }
    if let Some(year) = query.year.as_deref().filter(|y| !y.is_empty()) {
        url.push_str(&format!(
            "&primary_release_year={}",
            urlencoding::encode(year)
        ));
    }
    if let Some(rating) = query.min_rating {
        url.push_str(&format!("&vote_average.gte={rating}"));
    }
    url.push_str(&format!("&vote_count.gte={MIN_VOTE_COUNT}&page=1"));
    url
}

pub fn genres_url(base: &str, api_key: &str) -> String {
    format!("{base}/genre/movie/list?api_key={api_key}&language={LANGUAGE}")
}

#[derive(Debug, Deserialize)]
struct ResultsPage {
    results: Option<Vec<Movie>>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    genres: Option<Vec<Genre>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    status_message: Option<String>,
}
