use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::catalog::{DetailView, GenreView, HomeView, MovieCatalog};
use crate::models::{GenreId, MovieId};

#[derive(Clone)]
pub struct AppState {
    pub catalog: MovieCatalog,
}

pub async fn run_server(catalog: MovieCatalog, addr: SocketAddr) -> Result<()> {
    let app = build_router(AppState { catalog }).layer(TraceLayer::new_for_http());

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server stopped unexpectedly")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home))
        .route("/api/home/retry", post(retry_home))
        .route("/api/genres", get(genre_movies))
        .route("/api/genres/retry", post(retry_genre))
        .route("/api/genres/:id", put(select_genre))
        .route("/api/details", get(details).delete(close_details))
        .route("/api/details/:id", post(open_details))
        .route("/api/carousel/:index", post(jump_carousel))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn home(State(state): State<AppState>) -> Json<HomeView> {
    Json(state.catalog.home())
}

async fn retry_home(State(state): State<AppState>) -> (StatusCode, Json<HomeView>) {
    state.catalog.retry_bootstrap();
    (StatusCode::ACCEPTED, Json(state.catalog.home()))
}

async fn genre_movies(State(state): State<AppState>) -> Json<GenreView> {
    Json(state.catalog.genre_view())
}

async fn select_genre(State(state): State<AppState>, Path(id): Path<GenreId>) -> Response {
    if !state.catalog.select_genre(id) {
        warn!(genre_id = id, "Rejecting selection of unknown genre");
        return StatusCode::NOT_FOUND.into_response();
    }
    (StatusCode::ACCEPTED, Json(state.catalog.genre_view())).into_response()
}

async fn retry_genre(State(state): State<AppState>) -> Response {
    if !state.catalog.retry_genre() {
        return StatusCode::CONFLICT.into_response();
    }
    (StatusCode::ACCEPTED, Json(state.catalog.genre_view())).into_response()
}

async fn details(State(state): State<AppState>) -> Json<DetailView> {
    Json(state.catalog.detail_view())
}

async fn open_details(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> (StatusCode, Json<DetailView>) {
    state.catalog.open_details(id);
    (StatusCode::ACCEPTED, Json(state.catalog.detail_view()))
}

async fn close_details(State(state): State<AppState>) -> StatusCode {
    state.catalog.close_details();
    StatusCode::NO_CONTENT
}

async fn jump_carousel(State(state): State<AppState>, Path(index): Path<usize>) -> StatusCode {
    if state.catalog.jump_carousel(index) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
