use thiserror::Error;

use crate::models::{GenreId, MovieId};

/// Which of the bootstrap fetches a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Trending,
    Popular,
    TopRated,
    Genres,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Trending,
        Category::Popular,
        Category::TopRated,
        Category::Genres,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Trending => "trending movies",
            Category::Popular => "popular movies",
            Category::TopRated => "top rated movies",
            Category::Genres => "genres",
        }
    }
}

/// Failures surfaced to the presentation layer.
///
/// The underlying `anyhow` cause is logged where the fetch settles; only the
/// short message here is kept in state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Failed to load {}: {message}", .category.label())]
    Bootstrap { category: Category, message: String },

    #[error("Failed to load movies for genre {genre_id}")]
    GenreFetch { genre_id: GenreId },

    #[error("Failed to load movie details")]
    DetailFetch { movie_id: MovieId },
}

impl CatalogError {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::Bootstrap { .. } => "bootstrap",
            CatalogError::GenreFetch { .. } => "genre_fetch",
            CatalogError::DetailFetch { .. } => "detail_fetch",
        }
    }

    pub fn bootstrap(category: Category, cause: &anyhow::Error) -> Self {
        CatalogError::Bootstrap {
            category,
            message: cause.to_string(),
        }
    }
}
