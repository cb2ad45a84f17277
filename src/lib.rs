pub mod config;
pub mod content;
pub mod error;
pub mod page;
pub mod playback;
pub mod prefs;
pub mod search;
pub mod timecode;

pub use config::{Config, StorageConfig};
pub use content::{Cue, Hymn, Language, Level, Recording, Site, TranscriptRow, Year};
pub use error::*;
pub use page::{HymnPage, PageElements, PageInit, PageView};
pub use playback::{
    Effect, EffectLog, PlaybackSource, PlaybackState, SegmentIndex, Synchronizer, TranscriptView,
};
pub use prefs::{FontRange, PageKeySource, PreferenceStore};
pub use timecode::{format_timecode, parse_start_attr, parse_timecode};

/// Replay a series of media positions (milliseconds) against a hymn's
/// transcript and return the effects each position produced.
///
/// Handy for checking authored cue times without a browser.
pub fn replay(hymn: &Hymn, positions_ms: &[i64]) -> Vec<(i64, Vec<Effect>)> {
    let mut sync = Synchronizer::new(hymn.segment_index());
    let mut view = EffectLog::new();
    positions_ms
        .iter()
        .map(|&t| {
            sync.on_time_progress(t, &mut view);
            (t, view.drain())
        })
        .collect()
}
