//! Rotating "featured" banner.
//!
//! [`CarouselPhase`] is the pure state machine; [`Carousel`] owns the task
//! that drives it from a timer and from the category bundle. Dropping the
//! `Carousel` aborts that task together with any pending timer.

use serde::Serialize;
use std::future::pending;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::categories::CategoryState;
use crate::models::{MovieId, MovieSummary};

/// Number of trending movies that rotate through the banner.
pub const FEATURED_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarouselTiming {
    /// Time spent on a slide before rotating.
    pub interval: Duration,
    /// Fade window between two slides.
    pub transition: Duration,
}

impl Default for CarouselTiming {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(8_000),
            transition: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CarouselPhase {
    #[default]
    Idle,
    Showing { index: usize },
    Transitioning { from: usize, to: usize },
}

impl CarouselPhase {
    /// Starting phase for a featured set of `len` movies.
    pub fn reset(len: usize) -> Self {
        if len == 0 {
            CarouselPhase::Idle
        } else {
            CarouselPhase::Showing { index: 0 }
        }
    }

    /// The slide currently on screen (fading out while transitioning).
    pub fn index(self) -> Option<usize> {
        match self {
            CarouselPhase::Idle => None,
            CarouselPhase::Showing { index } => Some(index),
            CarouselPhase::Transitioning { from, .. } => Some(from),
        }
    }

    /// Timer tick: start fading towards the next slide.
    pub fn advance(self, len: usize) -> Self {
        match self {
            CarouselPhase::Showing { index } if len > 0 => CarouselPhase::Transitioning {
                from: index,
                to: (index + 1) % len,
            },
            other => other,
        }
    }

    /// Indicator click: fade straight to `target`.
    pub fn jump(self, target: usize, len: usize) -> Self {
        if target >= len {
            return self;
        }
        match self.index() {
            Some(from) => CarouselPhase::Transitioning { from, to: target },
            None => self,
        }
    }

    /// End of the fade window.
    pub fn settle(self) -> Self {
        match self {
            CarouselPhase::Transitioning { to, .. } => CarouselPhase::Showing { index: to },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarouselView {
    pub phase: CarouselPhase,
    pub featured: Vec<MovieSummary>,
}

impl CarouselView {
    pub fn current(&self) -> Option<&MovieSummary> {
        self.phase.index().and_then(|i| self.featured.get(i))
    }
}

enum Command {
    Jump(usize),
}

pub struct Carousel {
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<CarouselView>,
    task: JoinHandle<()>,
}

impl Carousel {
    /// Starts the driver. It stays `Idle` until `categories` carries a loaded,
    /// non-empty trending list. Must be called from within a tokio runtime.
    pub fn spawn(categories: watch::Receiver<CategoryState>, timing: CarouselTiming) -> Self {
        let (view_tx, view) = watch::channel(CarouselView::default());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(drive(view_tx, categories, command_rx, timing));
        Self {
            commands,
            view,
            task,
        }
    }

    pub fn view(&self) -> CarouselView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CarouselView> {
        self.view.clone()
    }

    /// Requests a transition to slide `index`. Returns false when the index
    /// is outside the featured set. Rotation restarts once the fade lands, so
    /// the chosen slide is shown for a full interval.
    pub fn jump_to(&self, index: usize) -> bool {
        if index >= self.view.borrow().featured.len() {
            return false;
        }
        self.commands.send(Command::Jump(index)).is_ok()
    }
}

impl Drop for Carousel {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn featured_from(categories: &CategoryState) -> Vec<MovieSummary> {
    categories.featured(FEATURED_COUNT)
}

fn ids(movies: &[MovieSummary]) -> Vec<MovieId> {
    movies.iter().map(|m| m.id).collect()
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => pending::<()>().await,
    }
}

async fn drive(
    view: watch::Sender<CarouselView>,
    mut categories: watch::Receiver<CategoryState>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    timing: CarouselTiming,
) {
    let mut ticker: Option<Interval> = None;
    let mut settle_at: Option<Instant> = None;
    // Set while a jump's fade is pending: the landed slide gets a full interval.
    let mut restart_after_settle = false;
    let mut upstream_open = true;

    let initial = featured_from(&categories.borrow_and_update());
    load(&view, initial, &mut ticker, &mut settle_at, timing);

    loop {
        tokio::select! {
            _ = next_tick(&mut ticker), if settle_at.is_none() => {
                let mut started = false;
                view.send_if_modified(|v| {
                    let next = v.phase.advance(v.featured.len());
                    started = next != v.phase;
                    v.phase = next;
                    started
                });
                if started {
                    settle_at = Some(Instant::now() + timing.transition);
                    restart_after_settle = false;
                }
            }
            _ = deadline(settle_at) => {
                settle_at = None;
                view.send_modify(|v| v.phase = v.phase.settle());
                if std::mem::take(&mut restart_after_settle) {
                    // A tick that came due mid-fade would otherwise fire at once.
                    if let Some(ticker) = ticker.as_mut() {
                        ticker.reset();
                    }
                }
            }
            changed = categories.changed(), if upstream_open => match changed {
                Ok(()) => {
                    let featured = featured_from(&categories.borrow_and_update());
                    load(&view, featured, &mut ticker, &mut settle_at, timing);
                }
                Err(_) => upstream_open = false,
            },
            command = commands.recv() => match command {
                Some(Command::Jump(target)) => {
                    let mut started = false;
                    view.send_if_modified(|v| {
                        let next = v.phase.jump(target, v.featured.len());
                        started = next != v.phase;
                        v.phase = next;
                        started
                    });
                    if started {
                        settle_at = Some(Instant::now() + timing.transition);
                        restart_after_settle = true;
                    }
                }
                None => break,
            },
        }
    }
    debug!("Carousel driver stopped");
}

/// Swaps in a new featured set. The timer is dropped for an empty set and
/// re-armed from now for a non-empty one.
fn load(
    view: &watch::Sender<CarouselView>,
    featured: Vec<MovieSummary>,
    ticker: &mut Option<Interval>,
    settle_at: &mut Option<Instant>,
    timing: CarouselTiming,
) {
    if ids(&featured) == ids(&view.borrow().featured) && ticker.is_some() == !featured.is_empty() {
        return;
    }
    let len = featured.len();
    view.send_modify(|v| {
        v.phase = CarouselPhase::reset(len);
        v.featured = featured;
    });
    *settle_at = None;
    *ticker = if len == 0 {
        None
    } else {
        Some(new_ticker(timing.interval))
    };
    debug!(featured = len, "Carousel featured set replaced");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_then_settle_moves_to_next_slide() {
        let phase = CarouselPhase::reset(5);
        assert_eq!(phase, CarouselPhase::Showing { index: 0 });
        let fading = phase.advance(5);
        assert_eq!(fading, CarouselPhase::Transitioning { from: 0, to: 1 });
        assert_eq!(fading.index(), Some(0));
        assert_eq!(fading.settle(), CarouselPhase::Showing { index: 1 });
    }

    #[test]
    fn last_slide_wraps_to_first() {
        let phase = CarouselPhase::Showing { index: 4 }.advance(5).settle();
        assert_eq!(phase, CarouselPhase::Showing { index: 0 });
    }

    #[test]
    fn jump_targets_index_directly() {
        let phase = CarouselPhase::Showing { index: 1 }.jump(3, 5);
        assert_eq!(phase, CarouselPhase::Transitioning { from: 1, to: 3 });
        assert_eq!(phase.settle(), CarouselPhase::Showing { index: 3 });
        assert_eq!(
            CarouselPhase::Showing { index: 1 }.jump(7, 5),
            CarouselPhase::Showing { index: 1 }
        );
    }

    #[test]
    fn idle_ignores_ticks_and_jumps() {
        assert_eq!(CarouselPhase::reset(0), CarouselPhase::Idle);
        assert_eq!(CarouselPhase::Idle.advance(0), CarouselPhase::Idle);
        assert_eq!(CarouselPhase::Idle.jump(0, 5), CarouselPhase::Idle);
        assert_eq!(CarouselPhase::Idle.settle(), CarouselPhase::Idle);
    }
}
