#![allow(dead_code)]

use anyhow::anyhow;
use cineview::models::{Genre, MovieDetail, MovieSummary, Named};
use cineview::CatalogApi;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Trending,
    Popular,
    TopRated,
    Genres,
    ByGenre(u32),
    Detail(u32),
}

pub enum Reply {
    Movies(Vec<MovieSummary>),
    Genres(Vec<Genre>),
    Detail(MovieDetail),
    Fail(String),
}

/// Every call parks until the test resolves it, so tests pick the
/// completion order.
#[derive(Default)]
pub struct GatedCatalog {
    pending: Mutex<Vec<(Call, oneshot::Sender<Reply>)>>,
    calls: Mutex<Vec<Call>>,
}

impl GatedCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn gate(&self, call: Call) -> Reply {
        let (tx, rx) = oneshot::channel();
        self.calls.lock().unwrap().push(call);
        self.pending.lock().unwrap().push((call, tx));
        rx.await
            .unwrap_or_else(|_| Reply::Fail("gate dropped".to_string()))
    }

    pub fn call_count(&self, call: Call) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn has_pending(&self, call: Call) -> bool {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .any(|(c, tx)| *c == call && !tx.is_closed())
    }

    pub async fn wait_for_call(&self, call: Call) {
        for _ in 0..10_000 {
            if self.has_pending(call) {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("timed out waiting for call {:?}", call);
    }

    pub async fn wait_for_call_count(&self, call: Call, expected: usize) {
        for _ in 0..10_000 {
            if self.call_count(call) >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!(
            "timed out waiting for {} calls of {:?} (got {})",
            expected,
            call,
            self.call_count(call)
        );
    }

    /// Completes the oldest still-awaited request for `call`.
    pub async fn resolve(&self, call: Call, reply: Reply) {
        self.wait_for_call(call).await;
        let tx = {
            let mut pending = self.pending.lock().unwrap();
            pending.retain(|(_, tx)| !tx.is_closed());
            let index = pending
                .iter()
                .position(|(c, _)| *c == call)
                .expect("pending call present");
            pending.remove(index).1
        };
        let _ = tx.send(reply);
    }
}

fn movies_or_fail(reply: Reply) -> anyhow::Result<Vec<MovieSummary>> {
    match reply {
        Reply::Movies(movies) => Ok(movies),
        Reply::Fail(msg) => Err(anyhow!(msg)),
        _ => Err(anyhow!("unexpected reply for a movie list")),
    }
}

#[async_trait::async_trait]
impl CatalogApi for GatedCatalog {
    async fn fetch_trending(&self) -> anyhow::Result<Vec<MovieSummary>> {
        movies_or_fail(self.gate(Call::Trending).await)
    }

    async fn fetch_popular(&self) -> anyhow::Result<Vec<MovieSummary>> {
        movies_or_fail(self.gate(Call::Popular).await)
    }

    async fn fetch_top_rated(&self) -> anyhow::Result<Vec<MovieSummary>> {
        movies_or_fail(self.gate(Call::TopRated).await)
    }

    async fn fetch_genres(&self) -> anyhow::Result<Vec<Genre>> {
        match self.gate(Call::Genres).await {
            Reply::Genres(genres) => Ok(genres),
            Reply::Fail(msg) => Err(anyhow!(msg)),
            _ => Err(anyhow!("unexpected reply for genres")),
        }
    }

    async fn fetch_by_genre(&self, genre_id: u32) -> anyhow::Result<Vec<MovieSummary>> {
        movies_or_fail(self.gate(Call::ByGenre(genre_id)).await)
    }

    async fn fetch_detail(&self, movie_id: u32) -> anyhow::Result<MovieDetail> {
        match self.gate(Call::Detail(movie_id)).await {
            Reply::Detail(detail) => Ok(detail),
            Reply::Fail(msg) => Err(anyhow!(msg)),
            _ => Err(anyhow!("unexpected reply for detail")),
        }
    }
}

/// Answers immediately from fixed data.
#[derive(Default)]
pub struct StaticCatalog {
    pub trending: Vec<MovieSummary>,
    pub popular: Vec<MovieSummary>,
    pub top_rated: Vec<MovieSummary>,
    pub genres: Vec<Genre>,
    pub by_genre: HashMap<u32, Vec<MovieSummary>>,
    pub details: HashMap<u32, MovieDetail>,
    pub failing: HashSet<Call>,
    pub calls: Mutex<Vec<Call>>,
}

impl StaticCatalog {
    pub fn sample() -> Self {
        Self {
            trending: movies(1..=12),
            popular: movies(20..=25),
            top_rated: movies(30..=35),
            genres: vec![genre(28, "Action"), genre(35, "Comedy"), genre(18, "Drama")],
            by_genre: HashMap::from([(28, movies(40..=50)), (35, movies(60..=62))]),
            details: HashMap::from([(7, detail(7, "Seven"))]),
            ..Self::default()
        }
    }

    fn record(&self, call: Call) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.contains(&call) {
            return Err(anyhow!("{:?} unavailable", call));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogApi for StaticCatalog {
    async fn fetch_trending(&self) -> anyhow::Result<Vec<MovieSummary>> {
        self.record(Call::Trending)?;
        Ok(self.trending.clone())
    }

    async fn fetch_popular(&self) -> anyhow::Result<Vec<MovieSummary>> {
        self.record(Call::Popular)?;
        Ok(self.popular.clone())
    }

    async fn fetch_top_rated(&self) -> anyhow::Result<Vec<MovieSummary>> {
        self.record(Call::TopRated)?;
        Ok(self.top_rated.clone())
    }

    async fn fetch_genres(&self) -> anyhow::Result<Vec<Genre>> {
        self.record(Call::Genres)?;
        Ok(self.genres.clone())
    }

    async fn fetch_by_genre(&self, genre_id: u32) -> anyhow::Result<Vec<MovieSummary>> {
        self.record(Call::ByGenre(genre_id))?;
        Ok(self.by_genre.get(&genre_id).cloned().unwrap_or_default())
    }

    async fn fetch_detail(&self, movie_id: u32) -> anyhow::Result<MovieDetail> {
        self.record(Call::Detail(movie_id))?;
        self.details
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| anyhow!("no movie {}", movie_id))
    }
}

pub fn movie(id: u32, title: &str) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        overview: format!("Overview of {}", title),
        poster_path: Some(format!("/poster-{}.jpg", id)),
        backdrop_path: Some(format!("/backdrop-{}.jpg", id)),
        release_date: Some("2024-03-01".to_string()),
        vote_average: 7.666,
        vote_count: 1200,
        adult: false,
    }
}

pub fn movies(ids: impl IntoIterator<Item = u32>) -> Vec<MovieSummary> {
    ids.into_iter()
        .map(|id| movie(id, &format!("Movie {}", id)))
        .collect()
}

pub fn genre(id: u32, name: &str) -> Genre {
    Genre {
        id,
        name: name.to_string(),
    }
}

pub fn detail(id: u32, title: &str) -> MovieDetail {
    MovieDetail {
        summary: movie(id, title),
        runtime: Some(125),
        budget: 1_500_000,
        revenue: 250_000_000,
        tagline: Some("Every number counts.".to_string()),
        status: "Released".to_string(),
        original_language: "en".to_string(),
        homepage: None,
        imdb_id: Some(format!("tt{:07}", id)),
        genres: vec![genre(18, "Drama")],
        production_companies: vec![Named {
            name: "Studio".to_string(),
        }],
        production_countries: vec![Named {
            name: "United States of America".to_string(),
        }],
        spoken_languages: vec![Named {
            name: "English".to_string(),
        }],
    }
}

pub fn ids(movies: &[MovieSummary]) -> Vec<u32> {
    movies.iter().map(|m| m.id).collect()
}
