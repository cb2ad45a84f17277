//! # Playback Module
//!
//! Keep a lyric transcript in step with an audio recording.
//!
//! ## Purpose
//! A hymn page shows the lyrics as a table of rows, each tagged with the moment
//! (in milliseconds) the line starts in the recording. This module:
//! 1. **Indexes** the rows once at load time ([`SegmentIndex`])
//! 2. **Locates** the row playing at any timestamp with a binary search
//! 3. **Synchronizes** a single highlighted row with the audio, and turns row
//!    clicks into seeks ([`Synchronizer`])
//!
//! ## Sub-modules
//! - `types` - Segment, PlaybackState, the view/source ports, Effect
//! - `locator` - SegmentIndex and the "rightmost start <= t" lookup
//! - `engine` - The Synchronizer state machine
//!
//! ## Example
//! ```rust
//! use hymnal::playback::{EffectLog, Effect, SegmentIndex, Synchronizer};
//!
//! let index = SegmentIndex::from_markers(vec![Some("0"), Some("1000"), Some("2500")]);
//! let mut sync = Synchronizer::new(index);
//! let mut view = EffectLog::new();
//!
//! assert!(sync.on_time_progress(1200, &mut view));
//! assert_eq!(sync.active_index(), Some(1));
//! assert_eq!(view.effects()[0], Effect::Highlight { previous: None, next: 1 });
//!
//! // Same segment, nothing to do
//! assert!(!sync.on_time_progress(1300, &mut view));
//! ```
//!
//! ## Ports
//! The engine never touches a DOM or a media element directly:
//! - [`TranscriptView`] - moves the highlight and scrolls a row into view
//! - [`PlaybackSource`] - reports/sets the position and starts playback
//!
//! Hosts that cannot lend a live view (the WASM bindings) pass an [`EffectLog`]
//! and replay the recorded [`Effect`]s themselves.
//!
//! ## Related Modules
//! - `timecode` - Parses the start attributes the index is built from
//! - `page` - Wires the synchronizer to recordings, preferences and the view

mod types;
mod locator;
mod engine;

#[cfg(test)]
mod tests;

pub use types::{
    CommandSource, Effect, EffectLog, PlaybackSource, PlaybackState, ScrollBlock, ScrollOptions, Segment,
    TranscriptView,
};
pub use locator::{seconds_to_ms, SegmentIndex};
pub use engine::Synchronizer;
