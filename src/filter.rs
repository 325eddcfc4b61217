//! Turns raw form input from the suggestions screen into a discover query.
use chrono::{Datelike, Local};
use tracing::debug;

use crate::tmdb::DiscoverQuery;

pub const DEFAULT_RATING_TEXT: &str = "7";
const YEAR_CHOICES: i32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter {
    /// Genre id as picked, `""` for all genres.
    pub genre: String,
    /// Release year as picked, `""` for any year.
    pub year: String,
    pub rating_text: String,
    pub query: String,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            genre: String::new(),
            year: current_year().to_string(),
            rating_text: DEFAULT_RATING_TEXT.to_string(),
            query: String::new(),
        }
    }
}

impl SearchFilter {
    pub fn min_rating(&self) -> Option<f64> {
        parse_rating(&self.rating_text)
    }

    pub fn to_discover(&self) -> DiscoverQuery {
        DiscoverQuery {
            genre: non_empty(&self.genre),
            year: parse_year(&self.year),
            min_rating: self.min_rating(),
        }
    }
}

/// Parses the minimum rating field. Unparseable or out of `[0, 10]` means no filter.
pub fn parse_rating(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) if (0.0..=10.0).contains(&value) => Some(value),
        Ok(value) => {
            debug!("Ignoring out of range rating {}", value);
            None
        }
        Err(_) => {
            debug!("Ignoring non-numeric rating '{}'", text);
            None
        }
    }
}

pub fn parse_year(text: &str) -> Option<String> {
    let text = text.trim();
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        Some(text.to_string())
    } else {
        if !text.is_empty() {
            debug!("Ignoring malformed year '{}'", text);
        }
        None
    }
}

/// Years offered by the year picker, newest first.
pub fn year_choices() -> Vec<String> {
    let now = current_year();
    (0..YEAR_CHOICES).map(|i| (now - i).to_string()).collect()
}

fn current_year() -> i32 {
    Local::now().year()
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
