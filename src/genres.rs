use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEntry;
use crate::categories::CategoryState;
use crate::config::StalePolicy;
use crate::error::CatalogError;
use crate::models::{Genre, MovieSummary};
use crate::tmdb::CatalogApi;

/// The genre browser shows at most this many movies.
pub const GENRE_MOVIES_LIMIT: usize = 8;
/// And at most this many genre tabs.
pub const GENRE_TABS_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreState {
    selected: Option<Genre>,
    entry: CacheEntry<Vec<MovieSummary>>,
    latest_request: u64,
}

impl GenreState {
    pub fn selected(&self) -> Option<&Genre> {
        self.selected.as_ref()
    }

    /// The last committed list. Empty while nothing has resolved or after a failure.
    pub fn movies(&self) -> Vec<MovieSummary> {
        self.entry.data_or_default()
    }

    pub fn loading(&self) -> bool {
        self.entry.is_loading()
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.entry.error()
    }

    pub fn latest_request(&self) -> u64 {
        self.latest_request
    }
}

struct Shared {
    api: Arc<dyn CatalogApi>,
    state: watch::Sender<GenreState>,
    policy: StalePolicy,
}

/// Movies of the currently selected genre. Every selection starts a fresh
/// fetch; `StalePolicy` decides what happens to responses that arrive late.
pub struct GenreMovieCache {
    shared: Arc<Shared>,
    follower: Option<JoinHandle<()>>,
}

impl GenreMovieCache {
    pub fn new(api: Arc<dyn CatalogApi>, policy: StalePolicy) -> Self {
        let (state, _) = watch::channel(GenreState::default());
        Self {
            shared: Arc::new(Shared { api, state, policy }),
            follower: None,
        }
    }

    /// Like `new`, but also selects the first genre of `categories` whenever a
    /// bootstrap completes and the current selection is missing from it.
    pub fn following(
        api: Arc<dyn CatalogApi>,
        policy: StalePolicy,
        categories: watch::Receiver<CategoryState>,
    ) -> Self {
        let mut cache = Self::new(api, policy);
        cache.follower = Some(tokio::spawn(follow_categories(
            cache.shared.clone(),
            categories,
        )));
        cache
    }

    pub fn subscribe(&self) -> watch::Receiver<GenreState> {
        self.shared.state.subscribe()
    }

    pub fn snapshot(&self) -> GenreState {
        self.shared.state.borrow().clone()
    }

    pub fn policy(&self) -> StalePolicy {
        self.shared.policy
    }

    /// Switches the browser to `genre`. Selecting the genre that is already
    /// selected does nothing; `retry` is the way to refetch it.
    pub fn select_genre(&self, genre: Genre) {
        let unchanged = self
            .shared
            .state
            .borrow()
            .selected
            .as_ref()
            .is_some_and(|current| current.id == genre.id);
        if unchanged {
            debug!(genre_id = genre.id, "Genre already selected");
            return;
        }
        select(&self.shared, genre);
    }

    /// Refetches the current genre. Returns false when nothing is selected.
    pub fn retry(&self) -> bool {
        let current = self.shared.state.borrow().selected.clone();
        match current {
            Some(genre) => {
                info!(genre_id = genre.id, "Retrying genre movies");
                select(&self.shared, genre);
                true
            }
            None => false,
        }
    }
}

impl Drop for GenreMovieCache {
    fn drop(&mut self) {
        if let Some(follower) = self.follower.take() {
            follower.abort();
        }
    }
}

fn select(shared: &Arc<Shared>, genre: Genre) {
    let mut request = 0;
    shared.state.send_modify(|s| {
        s.latest_request += 1;
        request = s.latest_request;
        s.selected = Some(genre.clone());
        s.entry = CacheEntry::Loading;
    });
    debug!(genre_id = genre.id, request, "Loading movies for genre '{}'", genre.name);
    tokio::spawn(fetch_genre(shared.clone(), genre, request));
}

async fn fetch_genre(shared: Arc<Shared>, genre: Genre, request: u64) {
    let outcome = match shared.api.fetch_by_genre(genre.id).await {
        Ok(mut movies) => {
            movies.truncate(GENRE_MOVIES_LIMIT);
            Ok(movies)
        }
        Err(e) => {
            warn!(genre_id = genre.id, "Failed to load genre movies: {:?}", e);
            Err(CatalogError::GenreFetch { genre_id: genre.id })
        }
    };

    let policy = shared.policy;
    let committed = shared.state.send_if_modified(|s| {
        if policy == StalePolicy::LatestRequest && s.latest_request != request {
            return false;
        }
        s.entry = CacheEntry::from_result(outcome);
        true
    });
    if !committed {
        debug!(genre_id = genre.id, request, "Discarding superseded genre response");
    }
}

async fn follow_categories(shared: Arc<Shared>, mut categories: watch::Receiver<CategoryState>) {
    loop {
        let genres = {
            let snapshot = categories.borrow_and_update();
            if snapshot.loading() {
                Vec::new()
            } else {
                snapshot.genres()
            }
        };
        if let Some(first) = genres.first() {
            let kept = shared
                .state
                .borrow()
                .selected
                .as_ref()
                .is_some_and(|current| genres.iter().any(|g| g.id == current.id));
            if !kept {
                info!(genre_id = first.id, "Defaulting genre browser to '{}'", first.name);
                select(&shared, first.clone());
            }
        }
        if categories.changed().await.is_err() {
            break;
        }
    }
}
