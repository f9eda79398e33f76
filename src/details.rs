use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::cache::CacheEntry;
use crate::error::CatalogError;
use crate::images::image_url;
use crate::models::{MovieDetail, MovieId};
use crate::tmdb::CatalogApi;
use crate::utils::{format_rating, format_revenue, format_runtime, release_year};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    movie_id: Option<MovieId>,
    entry: CacheEntry<MovieDetail>,
    request: u64,
}

impl DetailState {
    pub fn movie_id(&self) -> Option<MovieId> {
        self.movie_id
    }

    pub fn movie(&self) -> Option<&MovieDetail> {
        self.entry.data()
    }

    pub fn loading(&self) -> bool {
        self.entry.is_loading()
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.entry.error()
    }

    pub fn request(&self) -> u64 {
        self.request
    }
}

/// Fetches one full movie record at a time. Driven by `Navigator`, which is
/// the only caller of `load` and `clear`.
pub struct DetailController {
    api: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<DetailState>>,
}

impl DetailController {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub(crate) fn load(&self, movie_id: MovieId) {
        let mut request = 0;
        self.state.send_modify(|s| {
            s.request += 1;
            request = s.request;
            s.movie_id = Some(movie_id);
            s.entry = CacheEntry::Loading;
        });
        debug!(movie_id, request, "Loading movie details");

        let api = self.api.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let outcome = api.fetch_detail(movie_id).await.map_err(|e| {
                error!(movie_id, "Failed to load movie details: {:?}", e);
                CatalogError::DetailFetch { movie_id }
            });
            let committed = state.send_if_modified(|s| {
                // Both checks: the id guards against a different movie, the
                // request number against a close/reopen of the same one.
                if s.request != request || s.movie_id != Some(movie_id) {
                    return false;
                }
                s.entry = CacheEntry::from_result(outcome);
                true
            });
            if !committed {
                debug!(movie_id, request, "Discarding stale movie details");
            }
        });
    }

    pub(crate) fn clear(&self) {
        self.state.send_modify(|s| {
            s.request += 1;
            s.movie_id = None;
            s.entry = CacheEntry::Idle;
        });
    }
}

/// Display-ready fields of a detail record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailSummary {
    pub title: String,
    pub year: String,
    pub rating: Option<String>,
    pub vote_count: u64,
    pub runtime: Option<String>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub language: Option<String>,
    pub genres: Vec<String>,
    pub companies: Option<String>,
    pub countries: Option<String>,
    pub spoken_languages: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub imdb_url: Option<String>,
}

impl DetailSummary {
    pub fn from_detail(detail: &MovieDetail) -> Self {
        let summary = &detail.summary;
        let joined = |names: Vec<&str>| (!names.is_empty()).then(|| names.join(", "));
        Self {
            title: summary.title.clone(),
            year: release_year(summary.release_date.as_deref()),
            rating: (summary.vote_average > 0.0).then(|| format_rating(summary.vote_average)),
            vote_count: summary.vote_count,
            runtime: detail
                .runtime
                .filter(|m| *m > 0)
                .map(|m| format_runtime(Some(m))),
            budget: (detail.budget > 0).then(|| format_revenue(detail.budget)),
            revenue: (detail.revenue > 0).then(|| format_revenue(detail.revenue)),
            language: Some(detail.original_language.to_uppercase()).filter(|l| !l.is_empty()),
            genres: detail.genres.iter().map(|g| g.name.clone()).collect(),
            companies: joined(detail.production_companies.iter().map(|c| c.name.as_str()).collect()),
            countries: joined(detail.production_countries.iter().map(|c| c.name.as_str()).collect()),
            spoken_languages: joined(detail.spoken_languages.iter().map(|l| l.name.as_str()).collect()),
            poster_url: summary
                .poster_path
                .as_deref()
                .map(|p| image_url(Some(p), None)),
            backdrop_url: summary
                .backdrop_path
                .as_deref()
                .map(|p| image_url(Some(p), None)),
            imdb_url: detail
                .imdb_id
                .as_ref()
                .map(|id| format!("https://www.imdb.com/title/{id}")),
        }
    }
}
