pub mod app;
pub mod cache;
pub mod carousel;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod details;
pub mod error;
pub mod genres;
pub mod images;
pub mod models;
pub mod selection;
pub mod tmdb;
pub mod utils;

pub use catalog::{CatalogOptions, MovieCatalog};
pub use config::{Config, StalePolicy};
pub use tmdb::{CatalogApi, TmdbClient};
