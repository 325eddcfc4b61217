use chrono::NaiveDate;

use crate::models::Movie;

const NO_OVERVIEW: &str = "Sinopse não disponível.";

/// Display strings for the movie detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    pub title: String,
    pub year: String,
    pub poster_url: Option<String>,
    pub rating: String,
    pub votes: String,
    pub overview: String,
    pub release_date: String,
    pub popularity: String,
    pub original_language: String,
}

impl From<&Movie> for MovieDetails {
    fn from(movie: &Movie) -> Self {
        let overview = if movie.overview.trim().is_empty() {
            NO_OVERVIEW.to_string()
        } else {
            movie.overview.clone()
        };
        Self {
            title: movie.title.clone(),
            year: movie.release_year().unwrap_or("N/A").to_string(),
            poster_url: movie.poster_url(),
            rating: format!("{:.1}", movie.vote_average),
            votes: format!("{} votos", movie.vote_count),
            overview,
            release_date: movie
                .release_date
                .as_deref()
                .map(brazilian_date)
                .unwrap_or_else(|| "N/A".to_string()),
            popularity: format!("{:.1}", movie.popularity),
            original_language: movie.original_language.to_uppercase(),
        }
    }
}

impl MovieDetails {
    pub fn render(&self) -> String {
        let mut out = format!("{} ({})\n", self.title, self.year);
        out.push_str(&format!("⭐ {} ({})\n", self.rating, self.votes));
        out.push_str(&format!("Sinopse: {}\n", self.overview));
        out.push_str(&format!("Data de Lançamento: {}\n", self.release_date));
        out.push_str(&format!("Popularidade: {}\n", self.popularity));
        out.push_str(&format!("Idioma Original: {}", self.original_language));
        if let Some(url) = &self.poster_url {
            out.push_str(&format!("\nPoster: {url}"));
        }
        out
    }
}

fn brazilian_date(iso: &str) -> String {
    match NaiveDate::parse_from_str(iso, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => "N/A".to_string(),
    }
}
