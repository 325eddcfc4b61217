use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::filter::SearchFilter;
use crate::models::{Genre, Movie};
use crate::tmdb::CatalogApi;

pub const NO_SEARCH_RESULTS: &str = "Nenhum filme encontrado para sua busca.";
pub const NO_FILTER_RESULTS: &str = "Nenhum filme encontrado com os filtros selecionados.";

#[derive(Debug, Clone, Default)]
pub struct SuggestionsState {
    pub genres: Vec<Genre>,
    pub movies: Vec<Movie>,
    pub filter: SearchFilter,
    pub advisory: Option<String>,
}

impl SuggestionsState {
    /// Movies the list shows; entries without a poster are not rendered.
    pub fn visible_movies(&self) -> Vec<&Movie> {
        self.movies
            .iter()
            .filter(|m| m.poster_url().is_some())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied { results: usize },
    /// A newer request was issued while this one was in flight.
    Stale,
    Skipped,
}

/// State behind the suggestions tab. Methods take `&self` so requests can
/// overlap; every request gets a generation number and only the newest one
/// may write its results.
pub struct SuggestionsScreen {
    catalog: Arc<dyn CatalogApi>,
    state: Mutex<SuggestionsState>,
    generation: AtomicU64,
}

impl SuggestionsScreen {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self {
            catalog,
            state: Mutex::new(SuggestionsState::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn snapshot(&self) -> SuggestionsState {
        self.state.lock().await.clone()
    }

    pub async fn update_filter(&self, edit: impl FnOnce(&mut SearchFilter)) {
        edit(&mut self.state.lock().await.filter);
    }

    pub async fn load_genres(&self) -> usize {
        let genres = self.catalog.list_genres().await;
        let count = genres.len();
        self.state.lock().await.genres = genres;
        debug!("Loaded {} genres", count);
        count
    }

    pub async fn quick_search(&self, query: &str) -> Outcome {
        let query = query.trim();
        if query.is_empty() {
            return Outcome::Skipped;
        }
        let (generation, _) = self
            .begin(|state| state.filter.query = query.to_string())
            .await;
        let movies = self.catalog.search_by_text(query).await;
        self.finish(generation, movies, NO_SEARCH_RESULTS).await
    }

    pub async fn search_with_filters(&self) -> Outcome {
        let (generation, discover) = self.begin(|state| state.filter.to_discover()).await;
        info!(?discover, "Searching suggestions");
        let movies = self.catalog.discover(&discover).await;
        self.finish(generation, movies, NO_FILTER_RESULTS).await
    }

    /// Clears the query and the list. In-flight responses are dropped.
    pub async fn clear_search(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        state.filter.query.clear();
        state.movies.clear();
        state.advisory = None;
    }

    async fn begin<T>(&self, prepare: impl FnOnce(&mut SuggestionsState) -> T) -> (u64, T) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.lock().await;
        let prepared = prepare(&mut state);
        state.advisory = None;
        (generation, prepared)
    }

    async fn finish(&self, generation: u64, movies: Vec<Movie>, empty_advisory: &str) -> Outcome {
        let mut state = self.state.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Dropping stale response for request {}", generation);
            return Outcome::Stale;
        }
        let results = movies.len();
        state.movies = movies;
        state.advisory = (results == 0).then(|| empty_advisory.to_string());
        Outcome::Applied { results }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tmdb::DiscoverQuery;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    fn movie(id: i64, poster: Option<&str>) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            overview: String::new(),
            poster_path: poster.map(str::to_string),
            release_date: Some("2020-01-01".to_string()),
            vote_average: 7.5,
            vote_count: 500,
            popularity: 10.0,
            original_language: "en".to_string(),
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        searches: StdMutex<Vec<String>>,
        discovers: StdMutex<Vec<DiscoverQuery>>,
        results: Vec<Movie>,
        /// When set, searches for "slow" wait until notified.
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl CatalogApi for FakeCatalog {
        async fn search_by_text(&self, query: &str) -> Vec<Movie> {
            self.searches.lock().unwrap().push(query.to_string());
            if query == "slow" {
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                return vec![movie(1, Some("/old.jpg"))];
            }
            self.results.clone()
        }

        async fn discover(&self, query: &DiscoverQuery) -> Vec<Movie> {
            self.discovers.lock().unwrap().push(query.clone());
            self.results.clone()
        }

        async fn list_genres(&self) -> Vec<Genre> {
            vec![Genre {
                id: 28,
                name: "Ação".to_string(),
            }]
        }
    }

    #[tokio::test]
    async fn blank_query_is_a_no_op() {
        let catalog = Arc::new(FakeCatalog::default());
        let screen = SuggestionsScreen::new(catalog.clone());
        assert_eq!(screen.quick_search("   ").await, Outcome::Skipped);
        assert!(catalog.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_result_sets_advisory() {
        let screen = SuggestionsScreen::new(Arc::new(FakeCatalog::default()));
        assert_eq!(
            screen.quick_search("Matrix").await,
            Outcome::Applied { results: 0 }
        );
        let state = screen.snapshot().await;
        assert_eq!(state.advisory.as_deref(), Some(NO_SEARCH_RESULTS));

        screen.search_with_filters().await;
        let state = screen.snapshot().await;
        assert_eq!(state.advisory.as_deref(), Some(NO_FILTER_RESULTS));
    }

    #[tokio::test]
    async fn filters_flow_into_discover() {
        let catalog = Arc::new(FakeCatalog {
            results: vec![movie(1, Some("/a.jpg")), movie(2, None)],
            ..FakeCatalog::default()
        });
        let screen = SuggestionsScreen::new(catalog.clone());
        screen
            .update_filter(|f| {
                f.genre = "28".to_string();
                f.year = String::new();
                f.rating_text = "abc".to_string();
            })
            .await;
        assert_eq!(
            screen.search_with_filters().await,
            Outcome::Applied { results: 2 }
        );
        let sent = catalog.discovers.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![DiscoverQuery {
                genre: Some("28".to_string()),
                year: None,
                min_rating: None,
            }]
        );
        let state = screen.snapshot().await;
        assert_eq!(state.advisory, None);
        assert_eq!(state.visible_movies().len(), 1);
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_one() {
        let gate = Arc::new(Notify::new());
        let catalog = Arc::new(FakeCatalog {
            results: vec![movie(2, Some("/new.jpg"))],
            gate: Some(gate.clone()),
            ..FakeCatalog::default()
        });
        let screen = Arc::new(SuggestionsScreen::new(catalog.clone()));

        let slow = {
            let screen = screen.clone();
            tokio::spawn(async move { screen.quick_search("slow").await })
        };
        while catalog.searches.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            screen.quick_search("fast").await,
            Outcome::Applied { results: 1 }
        );
        gate.notify_one();
        assert_eq!(slow.await.unwrap(), Outcome::Stale);

        let state = screen.snapshot().await;
        assert_eq!(state.movies[0].id, 2);
        assert_eq!(state.filter.query, "fast");
    }

    #[tokio::test]
    async fn clear_search_empties_list() {
        let catalog = Arc::new(FakeCatalog {
            results: vec![movie(3, Some("/c.jpg"))],
            ..FakeCatalog::default()
        });
        let screen = SuggestionsScreen::new(catalog);
        screen.quick_search("Matrix").await;
        screen.clear_search().await;
        let state = screen.snapshot().await;
        assert!(state.movies.is_empty());
        assert!(state.filter.query.is_empty());
    }

    #[tokio::test]
    async fn loads_genres() {
        let screen = SuggestionsScreen::new(Arc::new(FakeCatalog::default()));
        assert_eq!(screen.load_genres().await, 1);
        assert_eq!(screen.snapshot().await.genres[0].name, "Ação");
    }
}
