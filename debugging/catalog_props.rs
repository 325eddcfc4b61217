//! Query the catalog directly and print what the suggestions list would receive.
//! Usage:
//!   cargo run --bin catalog_props -- search <text>
//!   cargo run --bin catalog_props -- discover [genre=<id>] [year=<yyyy>] [rating=<0-10>]
//!   cargo run --bin catalog_props -- genres
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{anyhow, Result};
use cinesuggest::filter::SearchFilter;
use cinesuggest::tmdb::TmdbClient;
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Search,
    Discover,
    Genres,
}

impl FromStr for Mode {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" => Ok(Mode::Search),
            "discover" => Ok(Mode::Discover),
            "genres" => Ok(Mode::Genres),
            _ => Err(anyhow!("mode must be 'search', 'discover' or 'genres'")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalog_props -- search <text>");
        eprintln!("       cargo run --bin catalog_props -- discover [genre=<id>] [year=<yyyy>] [rating=<0-10>]");
        eprintln!("       cargo run --bin catalog_props -- genres");
        std::process::exit(1);
    }

    let mode = Mode::from_str(&args[1])?;
    let client = TmdbClient::from_env()?;

    let output = match mode {
        Mode::Search => {
            let text = args[2..].join(" ");
            if text.trim().is_empty() {
                return Err(anyhow!("search needs some text"));
            }
            let movies = client.try_search_by_text(&text).await?;
            json!({ "query": text, "count": movies.len(), "results": movies })
        }
        Mode::Discover => {
            let filter = filter_from_args(&args[2..])?;
            let query = filter.to_discover();
            let movies = client.try_discover(&query).await?;
            json!({
                "genre": query.genre,
                "year": query.year,
                "min_rating": query.min_rating,
                "count": movies.len(),
                "with_poster": movies.iter().filter(|m| m.poster_url().is_some()).count(),
                "results": movies,
            })
        }
        Mode::Genres => {
            let genres = client.try_list_genres().await?;
            json!({ "count": genres.len(), "genres": genres })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// Unset keys mean "no constraint" here, unlike the interactive defaults.
fn filter_from_args(args: &[String]) -> Result<SearchFilter> {
    let mut filter = SearchFilter {
        year: String::new(),
        rating_text: String::new(),
        ..SearchFilter::default()
    };
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{arg}'"))?;
        match key {
            "genre" => filter.genre = value.to_string(),
            "year" => filter.year = value.to_string(),
            "rating" => filter.rating_text = value.to_string(),
            other => return Err(anyhow!("unknown filter '{other}'")),
        }
    }
    Ok(filter)
}
