use cinesuggest::tmdb::{CatalogApi, DiscoverQuery, TmdbClient};
use serde_json::json;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "tmdb-test-key";

fn page() -> serde_json::Value {
    json!({
        "page": 1,
        "results": [
            {
                "id": 603,
                "title": "Matrix",
                "overview": "Um hacker descobre a verdade.",
                "poster_path": "/matrix.jpg",
                "release_date": "1999-03-30",
                "vote_average": 8.2,
                "vote_count": 26000,
                "popularity": 71.4,
                "original_language": "en"
            },
            {
                "id": 604,
                "title": "Sem Poster",
                "poster_path": null,
                "release_date": "",
                "vote_average": 6.1
            }
        ],
        "total_results": 2
    })
}

async fn client(server: &MockServer) -> TmdbClient {
    TmdbClient::new(API_KEY, server.uri())
}

#[tokio::test]
async fn search_sends_text_and_locale() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("api_key", API_KEY))
        .and(query_param("language", "pt-BR"))
        .and(query_param("query", "O Poderoso Chefão"))
        .and(query_param("include_adult", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page()))
        .expect(1)
        .mount(&server)
        .await;

    let movies = client(&server)
        .await
        .search_by_text("O Poderoso Chefão")
        .await;
    assert_eq!(movies.len(), 2);
    assert_eq!(movies[0].title, "Matrix");
    assert_eq!(
        movies[0].poster_url().as_deref(),
        Some("https://image.tmdb.org/t/p/w500/matrix.jpg")
    );
    assert_eq!(movies[1].poster_url(), None);
    assert_eq!(movies[1].vote_count, 0);
}

#[tokio::test]
async fn discover_sends_only_set_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("sort_by", "popularity.desc"))
        .and(query_param("with_genres", "28"))
        .and(query_param("vote_average.gte", "7.5"))
        .and(query_param("vote_count.gte", "100"))
        .and(query_param_is_missing("primary_release_year"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page()))
        .expect(1)
        .mount(&server)
        .await;

    let query = DiscoverQuery {
        genre: Some("28".to_string()),
        year: None,
        min_rating: Some(7.5),
    };
    let movies = client(&server).await.discover(&query).await;
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn discover_without_filters_omits_optional_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param_is_missing("with_genres"))
        .and(query_param_is_missing("primary_release_year"))
        .and(query_param_is_missing("vote_average.gte"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let movies = client(&server)
        .await
        .discover(&DiscoverQuery::default())
        .await;
    assert!(movies.is_empty());
}

#[tokio::test]
async fn genres_are_listed_in_portuguese() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "pt-BR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "genres": [
                { "id": 28, "name": "Ação" },
                { "id": 35, "name": "Comédia" }
            ]
        })))
        .mount(&server)
        .await;

    let genres = client(&server).await.list_genres().await;
    let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["Ação", "Comédia"]);
}

#[tokio::test]
async fn failures_degrade_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status_code": 7,
            "status_message": "Invalid API key: You must be granted a valid key."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let tmdb = client(&server).await;
    assert!(tmdb.search_by_text("Matrix").await.is_empty());
    assert!(tmdb.discover(&DiscoverQuery::default()).await.is_empty());
    // Nothing mounted for genres: wiremock answers 404.
    assert!(tmdb.list_genres().await.is_empty());

    let err = tmdb
        .try_search_by_text("Matrix")
        .await
        .expect_err("401 is an error for the fallible variant");
    let message = format!("{err:#}");
    assert!(message.contains("Invalid API key"));
    assert!(!message.contains(API_KEY));
}

#[tokio::test]
async fn not_found_degrades_to_empty() {
    let server = MockServer::start().await;
    for endpoint in ["/search/movie", "/discover/movie"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status_code": 34,
                "status_message": "The resource you requested could not be found."
            })))
            .expect(2)
            .mount(&server)
            .await;
    }

    let tmdb = client(&server).await;
    assert!(tmdb.search_by_text("Matrix").await.is_empty());
    assert!(tmdb.discover(&DiscoverQuery::default()).await.is_empty());

    let err = tmdb
        .try_discover(&DiscoverQuery::default())
        .await
        .expect_err("404 is an error for the fallible variant");
    assert!(format!("{err:#}").contains("could not be found"));
    assert!(tmdb.try_search_by_text("Matrix").await.is_err());
}

#[tokio::test]
async fn malformed_json_degrades_to_empty() {
    let server = MockServer::start().await;
    for endpoint in ["/search/movie", "/discover/movie"] {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"results\": [{\"id\": "))
            .mount(&server)
            .await;
    }

    let tmdb = client(&server).await;
    assert!(tmdb.search_by_text("Matrix").await.is_empty());
    assert!(tmdb.discover(&DiscoverQuery::default()).await.is_empty());
    assert!(tmdb.try_search_by_text("Matrix").await.is_err());
}

#[tokio::test]
async fn missing_results_field_is_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "page": 1 })))
        .mount(&server)
        .await;

    let movies = client(&server).await.try_search_by_text("x").await;
    assert!(movies.expect("no results field is not an error").is_empty());
}
