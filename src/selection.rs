use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::details::{DetailController, DetailState};
use crate::models::MovieId;

/// The single "which movie is open" slot shared by every list.
///
/// Cloning hands out another reference to the same slot; all writes go
/// through `open_details` / `close_details`.
#[derive(Clone)]
pub struct Navigator {
    selected: Arc<watch::Sender<Option<MovieId>>>,
    details: Arc<DetailController>,
}

impl Navigator {
    pub fn new(details: DetailController) -> Self {
        let (selected, _) = watch::channel(None);
        Self {
            selected: Arc::new(selected),
            details: Arc::new(details),
        }
    }

    pub fn selected(&self) -> Option<MovieId> {
        *self.selected.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<MovieId>> {
        self.selected.subscribe()
    }

    pub fn details(&self) -> DetailState {
        self.details.snapshot()
    }

    pub fn subscribe_details(&self) -> watch::Receiver<DetailState> {
        self.details.subscribe()
    }

    /// Opens the detail view for `movie_id`. Opening the movie that is
    /// already open does nothing.
    pub fn open_details(&self, movie_id: MovieId) {
        // The detail fetch is started under the selection lock so concurrent
        // opens cannot leave the controller on a different id than the slot.
        let changed = self.selected.send_if_modified(|current| {
            if *current == Some(movie_id) {
                return false;
            }
            *current = Some(movie_id);
            self.details.load(movie_id);
            true
        });
        if changed {
            info!(movie_id, "Opened movie details");
        }
    }

    pub fn close_details(&self) {
        let mut previous = None;
        self.selected.send_modify(|current| {
            previous = current.take();
            self.details.clear();
        });
        if let Some(movie_id) = previous {
            info!(movie_id, "Closed movie details");
        }
    }
}
