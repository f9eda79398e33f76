//! Query TMDB through the catalog client and print what the caches would store.
//! Usage:
//!   cargo run --bin catalog_probe -- trending|popular|top-rated|genres
//!   cargo run --bin catalog_probe -- genre <genre_id>
//!   cargo run --bin catalog_probe -- detail <movie_id>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cineview::catalog::MovieCard;
use cineview::details::DetailSummary;
use cineview::{CatalogApi, TmdbClient};
use dotenvy::dotenv;
use serde_json::json;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Trending,
    Popular,
    TopRated,
    Genres,
    Genre,
    Detail,
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(Probe::Trending),
            "popular" => Ok(Probe::Popular),
            "top-rated" | "top_rated" => Ok(Probe::TopRated),
            "genres" => Ok(Probe::Genres),
            "genre" => Ok(Probe::Genre),
            "detail" => Ok(Probe::Detail),
            _ => Err(anyhow::anyhow!(
                "probe must be one of trending, popular, top-rated, genres, genre, detail"
            )),
        }
    }
}

fn usage() -> ! {
    eprintln!("Usage: cargo run --bin catalog_probe -- trending|popular|top-rated|genres");
    eprintln!("       cargo run --bin catalog_probe -- genre <genre_id>");
    eprintln!("       cargo run --bin catalog_probe -- detail <movie_id>");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage();
    }

    let probe = Probe::from_str(&args[1])?;
    let id: Option<u32> = match probe {
        Probe::Genre | Probe::Detail => Some(
            args.get(2)
                .ok_or_else(|| anyhow::anyhow!("missing id for {}", args[1]))?
                .parse()
                .context("id must be an integer")?,
        ),
        _ => None,
    };

    let client = TmdbClient::from_env()?;
    let output = match (probe, id) {
        (Probe::Trending, _) => cards(client.fetch_trending().await?),
        (Probe::Popular, _) => cards(client.fetch_popular().await?),
        (Probe::TopRated, _) => cards(client.fetch_top_rated().await?),
        (Probe::Genres, _) => json!(client.fetch_genres().await?),
        (Probe::Genre, Some(genre_id)) => cards(client.fetch_by_genre(genre_id).await?),
        (Probe::Detail, Some(movie_id)) => {
            let detail = client.fetch_detail(movie_id).await?;
            json!({
                "summary": DetailSummary::from_detail(&detail),
                "raw": detail,
            })
        }
        _ => usage(),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn cards(movies: Vec<cineview::models::MovieSummary>) -> serde_json::Value {
    let cards: Vec<MovieCard> = movies.iter().map(MovieCard::from).collect();
    json!({ "count": cards.len(), "movies": cards })
}
