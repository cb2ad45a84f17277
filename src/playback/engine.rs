//! Playback/transcript synchronizer
//!
//! Keeps exactly one transcript row highlighted while the recording plays, and
//! turns row clicks into seeks.
//!
//! All mutation happens inside the two event handlers, which the host calls
//! from a single event loop. The view receives the old and new rows in one
//! `highlight` call, so no frame ever shows zero or two active rows once
//! playback has started.

use super::locator::{seconds_to_ms, SegmentIndex};
use super::types::{PlaybackSource, PlaybackState, ScrollOptions, TranscriptView};

/// The highlight state machine.
///
/// States are `Idle` (nothing highlighted yet) and `Active(i)`. Time progress
/// moves the highlight to whatever segment contains the timestamp; a row
/// click seeks the source and moves the highlight immediately.
#[derive(Debug, Clone)]
pub struct Synchronizer<R = ()> {
    index: SegmentIndex<R>,
    state: PlaybackState,
    scroll: ScrollOptions,
}

impl<R> Synchronizer<R> {
    pub fn new(index: SegmentIndex<R>) -> Self {
        Self {
            index,
            state: PlaybackState::Idle,
            scroll: ScrollOptions::default(),
        }
    }

    /// Use different scroll options for highlight changes.
    pub fn with_scroll(mut self, scroll: ScrollOptions) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn set_scroll(&mut self, scroll: ScrollOptions) {
        self.scroll = scroll;
    }

    pub fn index(&self) -> &SegmentIndex<R> {
        &self.index
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.index()
    }

    /// State that `on_time_progress(timestamp_ms)` would move to.
    ///
    /// Depends only on the current state and the timestamp. An empty
    /// transcript stays in its current state.
    pub fn next_state(&self, timestamp_ms: i64) -> PlaybackState {
        if self.index.is_empty() {
            return self.state;
        }
        PlaybackState::Active(self.index.locate(timestamp_ms))
    }

    /// Handle a time-progress tick from the playback source.
    ///
    /// Returns `true` when the highlight moved. Repeated ticks inside the same
    /// segment are no-ops and do not scroll again.
    pub fn on_time_progress<V: TranscriptView>(&mut self, timestamp_ms: i64, view: &mut V) -> bool {
        match self.next_state(timestamp_ms) {
            PlaybackState::Active(next) => self.activate(next, view),
            PlaybackState::Idle => false,
        }
    }

    /// Read the source's current position and handle it as a tick.
    pub fn on_time_update<S, V>(&mut self, source: &S, view: &mut V) -> bool
    where
        S: PlaybackSource + ?Sized,
        V: TranscriptView,
    {
        self.on_time_progress(seconds_to_ms(source.current_time()), view)
    }

    /// Handle a click on transcript row `index`.
    ///
    /// Seeks the source to the row's start, asks it to play, and highlights the
    /// row without waiting for the source to report its new position. A
    /// refused `play` is logged and otherwise ignored. Returns the seek target
    /// in milliseconds, or `None` when `index` is out of range.
    pub fn on_segment_clicked<S, V>(&mut self, index: usize, source: &mut S, view: &mut V) -> Option<u64>
    where
        S: PlaybackSource + ?Sized,
        V: TranscriptView,
    {
        let Some(start_ms) = self.index.start_ms(index) else {
            log::debug!("ignoring click on row {} (transcript has {} rows)", index, self.index.len());
            return None;
        };

        source.set_current_time(start_ms as f64 / 1000.0);
        if let Err(e) = source.play() {
            log::debug!("play after seek to {} ms refused: {}", start_ms, e);
        }
        self.activate(index, view);
        Some(start_ms)
    }

    fn activate<V: TranscriptView>(&mut self, next: usize, view: &mut V) -> bool {
        let previous = self.state.index();
        if previous == Some(next) {
            return false;
        }
        log::trace!("highlight {:?} -> {}", previous, next);
        view.highlight(previous, next);
        view.scroll_into_view(next, self.scroll);
        self.state = PlaybackState::Active(next);
        true
    }
}
