//! Transcript sync type definitions
//!
//! This module defines the segment and state types of the sync engine and the
//! two ports it talks through: the transcript view (highlight + scroll) and the
//! playback source (position, rate, play).

use serde::{Deserialize, Serialize};

use crate::error::PlaybackError;

/// One transcript line tied to a moment in the recording.
///
/// `display_ref` is whatever handle the host uses to find the rendered row
/// again (a DOM index, an element id, `()` in tests). The engine never looks
/// inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<R = ()> {
    pub start_ms: u64,
    pub display_ref: R,
}

/// Highlight state owned by the synchronizer.
///
/// `Idle` only exists before the first update; once a segment has been
/// activated the state never returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "index", rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Idle,
    Active(usize),
}

impl PlaybackState {
    /// Active segment index, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Active(i) => Some(i),
        }
    }

    /// Index in the page script's encoding: `-1` for idle.
    pub fn as_raw(self) -> i64 {
        match self {
            PlaybackState::Idle => -1,
            PlaybackState::Active(i) => i as i64,
        }
    }
}

/// Where the newly active row should land in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBlock {
    Start,
    #[default]
    Center,
    End,
    Nearest,
}

/// Scroll-into-view request attached to every highlight change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollOptions {
    pub block: ScrollBlock,
    pub smooth: bool,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            block: ScrollBlock::Center,
            smooth: true,
        }
    }
}

/// Rendering side of the engine.
///
/// `highlight` receives the old and new active rows in one call so that an
/// adapter can swap the marker without an observable frame in between.
pub trait TranscriptView {
    fn highlight(&mut self, previous: Option<usize>, next: usize);
    fn scroll_into_view(&mut self, index: usize, options: ScrollOptions);
}

/// Media element side of the engine. Positions are in seconds, the media
/// element's native unit.
pub trait PlaybackSource {
    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, seconds: f64);
    fn set_playback_rate(&mut self, rate: f64);
    /// Point the source at a new media URL.
    fn load(&mut self, url: &str);
    /// Ask the source to start playing. Hosts may refuse (autoplay policy).
    fn play(&mut self) -> Result<(), PlaybackError>;
}

/// A single side effect requested by the engine or the page controller.
///
/// Hosts that cannot hand the engine a live view (the WASM bindings) collect
/// these with [`EffectLog`] and apply them afterwards, in order. Engine
/// effects (`Highlight`, `Scroll`, and the source commands `Seek`, `Rate`,
/// `Load`, `Play`) and page effects (`Language`, `Font`, `SpeedChip`) share
/// one enum so the host replays them as a single ordered stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Effect {
    #[serde(rename_all = "camelCase")]
    Highlight { previous: Option<usize>, next: usize },
    #[serde(rename_all = "camelCase")]
    Scroll { index: usize, options: ScrollOptions },
    Seek { seconds: f64 },
    Rate { rate: f64 },
    Load { url: String },
    Play,
    #[serde(rename_all = "camelCase")]
    Language { code: String, visible: bool },
    Font { px: u32 },
    /// Chip for `rate` is active and every other chip is not. `None` clears
    /// all chips.
    SpeedChip { rate: Option<f64> },
}

/// Records every effect instead of rendering it.
#[derive(Debug, Default, Clone)]
pub struct EffectLog {
    effects: Vec<Effect>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Take all recorded effects, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl TranscriptView for EffectLog {
    fn highlight(&mut self, previous: Option<usize>, next: usize) {
        self.push(Effect::Highlight { previous, next });
    }

    fn scroll_into_view(&mut self, index: usize, options: ScrollOptions) {
        self.push(Effect::Scroll { index, options });
    }
}

/// Playback source that records its commands as effects.
///
/// The position is whatever the host last reported with
/// [`report_position`](Self::report_position); seeks update it immediately.
/// `play` always succeeds here, the host decides whether playback starts.
#[derive(Debug, Default, Clone)]
pub struct CommandSource {
    position: f64,
    effects: Vec<Effect>,
}

impl CommandSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_position(&mut self, seconds: f64) {
        self.position = seconds;
    }

    pub fn drain(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl PlaybackSource for CommandSource {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds;
        self.effects.push(Effect::Seek { seconds });
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.effects.push(Effect::Rate { rate });
    }

    fn load(&mut self, url: &str) {
        self.effects.push(Effect::Load { url: url.to_string() });
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.effects.push(Effect::Play);
        Ok(())
    }
}
