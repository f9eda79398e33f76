use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::cache::CacheEntry;
use crate::error::{Category, CatalogError};
use crate::models::{Genre, MovieSummary};
use crate::tmdb::CatalogApi;

/// List endpoints are cut to this many entries before they are stored.
pub const CATEGORY_PAGE_SIZE: usize = 20;

/// The bootstrap bundle: three category lists plus the genre list.
///
/// The lists are only handed out once every slot has settled, so a consumer
/// sees either all four or none of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryState {
    trending: CacheEntry<Vec<MovieSummary>>,
    popular: CacheEntry<Vec<MovieSummary>>,
    top_rated: CacheEntry<Vec<MovieSummary>>,
    genres: CacheEntry<Vec<Genre>>,
    error: Option<CatalogError>,
    generation: u64,
}

impl CategoryState {
    fn loading_generation(generation: u64) -> Self {
        Self {
            trending: CacheEntry::Loading,
            popular: CacheEntry::Loading,
            top_rated: CacheEntry::Loading,
            genres: CacheEntry::Loading,
            error: None,
            generation,
        }
    }

    /// A fully loaded bundle from lists fetched elsewhere. Lets a `Carousel`
    /// be driven from a plain `watch` channel instead of a `CategoryCache`.
    pub fn settled(
        trending: Vec<MovieSummary>,
        popular: Vec<MovieSummary>,
        top_rated: Vec<MovieSummary>,
        genres: Vec<Genre>,
    ) -> Self {
        Self {
            trending: CacheEntry::Ready(trending),
            popular: CacheEntry::Ready(popular),
            top_rated: CacheEntry::Ready(top_rated),
            genres: CacheEntry::Ready(genres),
            error: None,
            generation: 0,
        }
    }

    /// How many of the four bootstrap fetches have succeeded or failed.
    pub fn settled_count(&self) -> usize {
        [
            self.trending.is_settled(),
            self.popular.is_settled(),
            self.top_rated.is_settled(),
            self.genres.is_settled(),
        ]
        .into_iter()
        .filter(|settled| *settled)
        .count()
    }

    pub fn loading(&self) -> bool {
        self.settled_count() < Category::ALL.len()
    }

    /// First failure in completion order, if any.
    pub fn error(&self) -> Option<&CatalogError> {
        self.error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trending(&self) -> Vec<MovieSummary> {
        self.visible(&self.trending)
    }

    pub fn popular(&self) -> Vec<MovieSummary> {
        self.visible(&self.popular)
    }

    pub fn top_rated(&self) -> Vec<MovieSummary> {
        self.visible(&self.top_rated)
    }

    pub fn genres(&self) -> Vec<Genre> {
        self.visible(&self.genres)
    }

    /// The first `count` trending movies, empty until the bundle is loaded.
    pub fn featured(&self, count: usize) -> Vec<MovieSummary> {
        let mut trending = self.trending();
        trending.truncate(count);
        trending
    }

    fn visible<T: Clone + Default>(&self, entry: &CacheEntry<T>) -> T {
        if self.loading() {
            T::default()
        } else {
            entry.data_or_default()
        }
    }
}

enum Fetched {
    Movies(Category, Result<Vec<MovieSummary>>),
    Genres(Result<Vec<Genre>>),
}

/// Owns the one-shot bootstrap of the home screen lists.
pub struct CategoryCache {
    api: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<CategoryState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CategoryCache {
    /// Creates the cache and immediately starts the bootstrap fetches.
    /// Must be called from within a tokio runtime.
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        let (state, _) = watch::channel(CategoryState::default());
        let cache = Self {
            api,
            state: Arc::new(state),
            task: Mutex::new(None),
        };
        cache.start();
        cache
    }

    pub fn subscribe(&self) -> watch::Receiver<CategoryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CategoryState {
        self.state.borrow().clone()
    }

    /// Throws away whatever the current bundle holds and runs all four
    /// fetches again from scratch.
    pub fn retry(&self) {
        info!("Retrying catalog bootstrap");
        self.start();
    }

    fn start(&self) {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = s.generation + 1;
            *s = CategoryState::loading_generation(generation);
        });
        info!(generation, "Starting catalog bootstrap");

        let handle = tokio::spawn(run_bootstrap(
            self.api.clone(),
            self.state.clone(),
            generation,
        ));
        let previous = match self.task.lock() {
            Ok(mut guard) => guard.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Drop for CategoryCache {
    fn drop(&mut self) {
        let task = match self.task.get_mut() {
            Ok(task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }
}

async fn run_bootstrap(
    api: Arc<dyn CatalogApi>,
    state: Arc<watch::Sender<CategoryState>>,
    generation: u64,
) {
    let mut fetches = JoinSet::new();
    let a = api.clone();
    fetches.spawn(async move { Fetched::Movies(Category::Trending, a.fetch_trending().await) });
    let a = api.clone();
    fetches.spawn(async move { Fetched::Movies(Category::Popular, a.fetch_popular().await) });
    let a = api.clone();
    fetches.spawn(async move { Fetched::Movies(Category::TopRated, a.fetch_top_rated().await) });
    let a = api;
    fetches.spawn(async move { Fetched::Genres(a.fetch_genres().await) });

    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok(Fetched::Movies(category, result)) => {
                let result = result.map(|mut movies| {
                    movies.truncate(CATEGORY_PAGE_SIZE);
                    movies
                });
                commit(&state, generation, category, result, |s| match category {
                    Category::Trending => &mut s.trending,
                    Category::Popular => &mut s.popular,
                    _ => &mut s.top_rated,
                });
            }
            Ok(Fetched::Genres(result)) => {
                commit(&state, generation, Category::Genres, result, |s| &mut s.genres);
            }
            Err(e) => error!("Bootstrap fetch task ended abnormally: {}", e),
        }
    }

    // A panicked fetch never reports back; fail whatever is still open so
    // the bundle does not stay loading forever.
    state.send_if_modified(|s| {
        if s.generation != generation || !s.loading() {
            return false;
        }
        for category in Category::ALL {
            let settled = match category {
                Category::Trending => s.trending.is_settled(),
                Category::Popular => s.popular.is_settled(),
                Category::TopRated => s.top_rated.is_settled(),
                Category::Genres => s.genres.is_settled(),
            };
            if settled {
                continue;
            }
            let failure = CatalogError::Bootstrap {
                category,
                message: "fetch task aborted".to_string(),
            };
            s.error.get_or_insert_with(|| failure.clone());
            match category {
                Category::Trending => s.trending = CacheEntry::Failed(failure),
                Category::Popular => s.popular = CacheEntry::Failed(failure),
                Category::TopRated => s.top_rated = CacheEntry::Failed(failure),
                Category::Genres => s.genres = CacheEntry::Failed(failure),
            }
        }
        true
    });

    let snapshot = state.borrow().clone();
    if snapshot.generation() != generation {
        return;
    }
    match snapshot.error() {
        None => info!(
            trending = snapshot.trending().len(),
            popular = snapshot.popular().len(),
            top_rated = snapshot.top_rated().len(),
            genres = snapshot.genres().len(),
            "Catalog bootstrap complete"
        ),
        Some(err) => warn!("Catalog bootstrap finished with an error: {}", err),
    }
}

fn commit<T>(
    state: &watch::Sender<CategoryState>,
    generation: u64,
    category: Category,
    result: Result<T>,
    slot: impl FnOnce(&mut CategoryState) -> &mut CacheEntry<T>,
) {
    let result = result.map_err(|e| {
        error!(category = ?category, "Failed to load {}: {:?}", category.label(), e);
        CatalogError::bootstrap(category, &e)
    });
    let committed = state.send_if_modified(|s| {
        if s.generation != generation {
            return false;
        }
        if let Err(err) = &result {
            match &s.error {
                None => s.error = Some(err.clone()),
                Some(first) => {
                    warn!(category = ?category, "Keeping earlier bootstrap error: {}", first)
                }
            }
        }
        *slot(s) = CacheEntry::from_result(result);
        true
    });
    if committed {
        debug!(category = ?category, generation, "Bootstrap slot settled");
    } else {
        debug!(category = ?category, generation, "Dropping result from a superseded bootstrap");
    }
}
