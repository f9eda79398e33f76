use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use crate::carousel::CarouselTiming;

/// How a cache treats a response that arrives after a newer request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalePolicy {
    /// Only the most recently issued request may commit; older responses are dropped.
    #[default]
    LatestRequest,
    /// Whatever resolves last is committed, regardless of request order.
    LastResolved,
}

impl StalePolicy {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "latest" | "latest-request" => Ok(StalePolicy::LatestRequest),
            "last-resolved" | "resolved" => Ok(StalePolicy::LastResolved),
            other => Err(anyhow!(
                "unknown stale response policy '{}' (expected 'latest' or 'last-resolved')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub language: String,
    pub bind: SocketAddr,
    pub carousel: CarouselTiming,
    pub stale_policy: StalePolicy,
}

pub const REQUIRED_ENV: [&str; 1] = ["TMDB_API_KEY"];

impl Config {
    pub fn from_env() -> Result<Self> {
        let tmdb_api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("TMDB_API_KEY must be set"))?;
        let language = env::var("CINEVIEW_LANGUAGE").unwrap_or_else(|_| "en-US".to_string());
        let bind = match env::var("CINEVIEW_BIND") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("CINEVIEW_BIND is not a socket address: {}", raw))?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3147)),
        };
        let defaults = CarouselTiming::default();
        let carousel = CarouselTiming {
            interval: millis_var("CINEVIEW_CAROUSEL_INTERVAL_MS")?.unwrap_or(defaults.interval),
            transition: millis_var("CINEVIEW_CAROUSEL_TRANSITION_MS")?
                .unwrap_or(defaults.transition),
        };
        let stale_policy = match env::var("CINEVIEW_STALE_RESPONSES") {
            Ok(raw) => StalePolicy::parse(&raw)?,
            Err(_) => StalePolicy::default(),
        };
        Ok(Self {
            tmdb_api_key,
            language,
            bind,
            carousel,
            stale_policy,
        })
    }
}

fn millis_var(key: &str) -> Result<Option<Duration>> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    let ms: u64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{} must be a number of milliseconds, got '{}'", key, raw))?;
    if ms == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(Some(Duration::from_millis(ms)))
}
