use serde::Serialize;
use std::sync::Arc;

use crate::carousel::{Carousel, CarouselPhase, CarouselTiming, CarouselView};
use crate::categories::{CategoryCache, CategoryState};
use crate::config::{Config, StalePolicy};
use crate::details::{DetailController, DetailState, DetailSummary};
use crate::error::CatalogError;
use crate::genres::{GenreMovieCache, GenreState, GENRE_TABS_LIMIT};
use crate::images::image_url;
use crate::models::{Genre, GenreId, MovieDetail, MovieId, MovieSummary};
use crate::selection::Navigator;
use crate::tmdb::CatalogApi;
use crate::utils::{format_rating, release_year};

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogOptions {
    pub carousel: CarouselTiming,
    pub stale_policy: StalePolicy,
}

impl From<&Config> for CatalogOptions {
    fn from(config: &Config) -> Self {
        Self {
            carousel: config.carousel,
            stale_policy: config.stale_policy,
        }
    }
}

/// Handle over every cache and state machine behind the catalog screens.
///
/// Cheap to clone; all clones share the same state. Constructing one starts
/// the bootstrap fetches, so it has to happen inside a tokio runtime.
#[derive(Clone)]
pub struct MovieCatalog {
    inner: Arc<Inner>,
}

struct Inner {
    categories: CategoryCache,
    genres: GenreMovieCache,
    navigator: Navigator,
    carousel: Carousel,
}

impl MovieCatalog {
    pub fn new(api: Arc<dyn CatalogApi>, options: CatalogOptions) -> Self {
        let categories = CategoryCache::new(api.clone());
        let genres =
            GenreMovieCache::following(api.clone(), options.stale_policy, categories.subscribe());
        let navigator = Navigator::new(DetailController::new(api));
        let carousel = Carousel::spawn(categories.subscribe(), options.carousel);
        Self {
            inner: Arc::new(Inner {
                categories,
                genres,
                navigator,
                carousel,
            }),
        }
    }

    pub fn from_config(api: Arc<dyn CatalogApi>, config: &Config) -> Self {
        Self::new(api, CatalogOptions::from(config))
    }

    pub fn categories(&self) -> &CategoryCache {
        &self.inner.categories
    }

    pub fn genres(&self) -> &GenreMovieCache {
        &self.inner.genres
    }

    pub fn navigator(&self) -> &Navigator {
        &self.inner.navigator
    }

    pub fn carousel(&self) -> &Carousel {
        &self.inner.carousel
    }

    pub fn home(&self) -> HomeView {
        HomeView::build(
            &self.inner.categories.snapshot(),
            self.inner.navigator.selected(),
            &self.inner.carousel.view(),
        )
    }

    pub fn retry_bootstrap(&self) {
        self.inner.categories.retry();
    }

    pub fn genre_view(&self) -> GenreView {
        GenreView::build(&self.inner.genres.snapshot())
    }

    /// Selects one of the genre tabs shown in `HomeView`. Returns false for
    /// ids outside them.
    pub fn select_genre(&self, genre_id: GenreId) -> bool {
        let genre = self
            .inner
            .categories
            .snapshot()
            .genres()
            .into_iter()
            .take(GENRE_TABS_LIMIT)
            .find(|g| g.id == genre_id);
        match genre {
            Some(genre) => {
                self.inner.genres.select_genre(genre);
                true
            }
            None => false,
        }
    }

    pub fn retry_genre(&self) -> bool {
        self.inner.genres.retry()
    }

    pub fn open_details(&self, movie_id: MovieId) {
        self.inner.navigator.open_details(movie_id);
    }

    pub fn close_details(&self) {
        self.inner.navigator.close_details();
    }

    pub fn detail_view(&self) -> DetailView {
        DetailView::build(&self.inner.navigator.details())
    }

    pub fn jump_carousel(&self, index: usize) -> bool {
        self.inner.carousel.jump_to(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
}

impl From<&CatalogError> for ErrorView {
    fn from(err: &CatalogError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A list tile: what every slider and grid renders per movie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCard {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub rating: String,
    pub year: String,
    pub adult: bool,
}

impl From<&MovieSummary> for MovieCard {
    fn from(movie: &MovieSummary) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            poster_url: image_url(movie.poster_path.as_deref(), Some("w500")),
            backdrop_url: image_url(movie.backdrop_path.as_deref(), None),
            rating: format_rating(movie.vote_average),
            year: release_year(movie.release_date.as_deref()),
            adult: movie.adult,
        }
    }
}

fn cards(movies: &[MovieSummary]) -> Vec<MovieCard> {
    movies.iter().map(MovieCard::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarouselCardView {
    pub phase: CarouselPhase,
    pub current: Option<MovieCard>,
    pub slides: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub loading: bool,
    pub error: Option<ErrorView>,
    pub trending: Vec<MovieCard>,
    pub popular: Vec<MovieCard>,
    pub top_rated: Vec<MovieCard>,
    pub genres: Vec<Genre>,
    pub selected_movie_id: Option<MovieId>,
    pub carousel: CarouselCardView,
}

impl HomeView {
    pub fn build(
        categories: &CategoryState,
        selected_movie_id: Option<MovieId>,
        carousel: &CarouselView,
    ) -> Self {
        let mut genres = categories.genres();
        genres.truncate(GENRE_TABS_LIMIT);
        Self {
            loading: categories.loading(),
            error: categories.error().map(ErrorView::from),
            trending: cards(&categories.trending()),
            popular: cards(&categories.popular()),
            top_rated: cards(&categories.top_rated()),
            genres,
            selected_movie_id,
            carousel: CarouselCardView {
                phase: carousel.phase,
                current: carousel.current().map(MovieCard::from),
                slides: carousel.featured.len(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreView {
    pub selected: Option<Genre>,
    pub movies: Vec<MovieCard>,
    pub loading: bool,
    pub error: Option<ErrorView>,
}

impl GenreView {
    pub fn build(state: &GenreState) -> Self {
        Self {
            selected: state.selected().cloned(),
            movies: cards(&state.movies()),
            loading: state.loading(),
            error: state.error().map(ErrorView::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub movie_id: Option<MovieId>,
    pub loading: bool,
    pub error: Option<ErrorView>,
    pub movie: Option<MovieDetail>,
    pub summary: Option<DetailSummary>,
}

impl DetailView {
    pub fn build(state: &DetailState) -> Self {
        Self {
            movie_id: state.movie_id(),
            loading: state.loading(),
            error: state.error().map(ErrorView::from),
            movie: state.movie().cloned(),
            summary: state.movie().map(DetailSummary::from_detail),
        }
    }
}
