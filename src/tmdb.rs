use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::models::{Genre, GenreId, MovieDetail, MovieId, MovieSummary};

const TMDB_BASE: &str = "https://api.themoviedb.org/3";

/// The remote movie-metadata source every cache reads from.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_trending(&self) -> Result<Vec<MovieSummary>>;
    async fn fetch_popular(&self) -> Result<Vec<MovieSummary>>;
    async fn fetch_top_rated(&self) -> Result<Vec<MovieSummary>>;
    async fn fetch_genres(&self) -> Result<Vec<Genre>>;
    async fn fetch_by_genre(&self, genre_id: GenreId) -> Result<Vec<MovieSummary>>;
    async fn fetch_detail(&self, movie_id: MovieId) -> Result<MovieDetail>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    language: String,
}

#[derive(Debug, Deserialize)]
struct MoviePage {
    #[serde(default)]
    results: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cineview/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            language: language.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.tmdb_api_key.clone(), config.language.clone())
    }

    pub fn from_env() -> Result<Self> {
        Self::from_config(&Config::from_env()?)
    }

    fn url(&self, path: &str, extra: &str) -> String {
        format!(
            "{TMDB_BASE}{path}?api_key={}&language={}{extra}",
            urlencoding::encode(&self.api_key),
            urlencoding::encode(&self.language)
        )
    }

    async fn fetch_page(&self, path: &str, extra: &str) -> Result<Vec<MovieSummary>> {
        let page: MoviePage = self.get_json(&self.url(path, extra)).await?;
        Ok(page.results)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            // The URL carries the api key, so only the path makes it into the error.
            let path = url.split('?').next().unwrap_or(url);
            return Err(anyhow!("{} -> {} {}", path, status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn fetch_trending(&self) -> Result<Vec<MovieSummary>> {
        self.fetch_page("/trending/movie/week", "")
            .await
            .context("fetching trending movies")
    }

    async fn fetch_popular(&self) -> Result<Vec<MovieSummary>> {
        self.fetch_page("/movie/popular", "&page=1")
            .await
            .context("fetching popular movies")
    }

    async fn fetch_top_rated(&self) -> Result<Vec<MovieSummary>> {
        self.fetch_page("/movie/top_rated", "&page=1")
            .await
            .context("fetching top rated movies")
    }

    async fn fetch_genres(&self) -> Result<Vec<Genre>> {
        let list: GenreList = self
            .get_json(&self.url("/genre/movie/list", ""))
            .await
            .context("fetching genre list")?;
        Ok(list.genres)
    }

    async fn fetch_by_genre(&self, genre_id: GenreId) -> Result<Vec<MovieSummary>> {
        let extra = format!("&with_genres={genre_id}&sort_by=popularity.desc&page=1");
        self.fetch_page("/discover/movie", &extra)
            .await
            .with_context(|| format!("fetching movies for genre {genre_id}"))
    }

    async fn fetch_detail(&self, movie_id: MovieId) -> Result<MovieDetail> {
        self.get_json(&self.url(&format!("/movie/{movie_id}"), ""))
            .await
            .with_context(|| format!("fetching details for movie {movie_id}"))
    }
}
