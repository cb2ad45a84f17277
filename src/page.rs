//! # Hymn Page Controller
//!
//! Everything on a hymn page around the transcript sync: recording choice,
//! speed chips, language toggles and font size, all backed by the preference
//! store.
//!
//! ## Missing elements
//! A page may leave out any control. [`PageElements`] says which ones exist,
//! and each feature is set up on its own: a page without font buttons still
//! gets its saved font size applied, a page without an audio element still
//! loads language preferences, and so on. Only the transcript table is
//! required; [`HymnPage::mount`] returns `None` without it.
//!
//! ## Storage failures
//! Writes to the preference store are best effort. A failed write is logged at
//! `warn` and the on-screen state keeps the user's choice.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config::Config;
use crate::content::{Recording, TranscriptRow};
use crate::error::HymnalError;
use crate::playback::{
    seconds_to_ms, Effect, EffectLog, PlaybackSource, SegmentIndex, Synchronizer, TranscriptView,
};
use crate::timecode::parse_timecode;
use crate::prefs::{self, LanguageToggle, PreferenceStore};

/// Page-level rendering port, on top of the transcript view.
///
/// Every method defaults to doing nothing, so a host only implements what its
/// page actually shows.
pub trait PageView: TranscriptView {
    /// Show or hide every element tagged with language `code`, and set the
    /// matching toggle's checked state.
    fn show_language(&mut self, _code: &str, _visible: bool) {}
    /// Apply the lyric font size.
    fn apply_font_px(&mut self, _px: u32) {}
    /// Mark the speed chip for `rate` as active and clear the others.
    /// `None` (a rate no chip offers) clears every chip.
    fn mark_speed_chip(&mut self, _rate: Option<f64>) {}
}

impl PageView for EffectLog {
    fn show_language(&mut self, code: &str, visible: bool) {
        self.push(Effect::Language {
            code: code.to_string(),
            visible,
        });
    }

    fn apply_font_px(&mut self, px: u32) {
        self.push(Effect::Font { px });
    }

    fn mark_speed_chip(&mut self, rate: Option<f64>) {
        self.push(Effect::SpeedChip { rate });
    }
}

/// Which optional controls the page has.
#[derive(Debug, Clone, Default)]
pub struct PageElements {
    pub audio: bool,
    pub recording_select: bool,
    pub font_controls: bool,
    pub speed_chips: Vec<f64>,
    pub language_toggles: Vec<LanguageToggle>,
}

/// One user interaction with a mounted page, as written on the command line.
///
/// | Text | Action |
/// |------|--------|
/// | `rec=1` | select recording 1 |
/// | `speed=1.25` | speed chip |
/// | `lang=cop` | flip a language toggle |
/// | `font+`, `font-`, `font=20` | font buttons or an explicit size |
/// | `at=0:06.5` | media time update |
/// | `click=3` | click on transcript row 3 |
#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    SelectRecording(usize),
    Speed(f64),
    ToggleLanguage(String),
    FontPlus,
    FontMinus,
    Font(i64),
    TimeUpdate { seconds: f64 },
    RowClicked(usize),
}

impl FromStr for PageAction {
    type Err = HymnalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || HymnalError::Action(s.to_string());
        match s {
            "font+" => return Ok(PageAction::FontPlus),
            "font-" => return Ok(PageAction::FontMinus),
            _ => {}
        }
        let (name, value) = s.split_once('=').ok_or_else(bad)?;
        match name {
            "rec" => value.parse().map(PageAction::SelectRecording).map_err(|_| bad()),
            "speed" => value.parse().map(PageAction::Speed).map_err(|_| bad()),
            "lang" if !value.is_empty() => Ok(PageAction::ToggleLanguage(value.to_string())),
            "font" => value.parse().map(PageAction::Font).map_err(|_| bad()),
            "at" => {
                let ms = parse_timecode(value)?;
                Ok(PageAction::TimeUpdate {
                    seconds: ms as f64 / 1000.0,
                })
            }
            "click" => value.parse().map(PageAction::RowClicked).map_err(|_| bad()),
            _ => Err(bad()),
        }
    }
}

/// Everything a hymn page is mounted from.
///
/// `rows` is the transcript table; `None` when the page has none.
#[derive(Debug, Clone)]
pub struct PageInit<'a, S> {
    pub config: Config,
    pub page_key: String,
    pub store: S,
    pub elements: PageElements,
    pub rows: Option<&'a [TranscriptRow]>,
    pub recordings: Vec<Recording>,
}

/// Live state of one hymn page.
pub struct HymnPage<S: PreferenceStore> {
    config: Config,
    page_key: String,
    store: S,
    elements: PageElements,
    recordings: Vec<Recording>,
    selected_recording: Option<usize>,
    speed: Option<f64>,
    visibility: BTreeMap<String, bool>,
    font_px: u32,
    sync: Synchronizer<usize>,
}

impl<S: PreferenceStore> HymnPage<S> {
    /// Set up the page.
    ///
    /// Runs the same startup sequence as the page script: select the first
    /// recording, reapply a saved speed, apply language visibility and apply
    /// the font size. Returns `None` when there is no transcript table
    /// (`init.rows` is `None`).
    pub fn mount<P, V>(init: PageInit<'_, S>, source: &mut P, view: &mut V) -> Option<Self>
    where
        P: PlaybackSource + ?Sized,
        V: PageView,
    {
        let PageInit {
            config,
            page_key,
            store,
            elements,
            rows,
            recordings,
        } = init;
        let rows = rows?;
        let index = SegmentIndex::build(
            rows.iter()
                .enumerate()
                .map(|(i, row)| (Some(row.start_attr.as_str()), i)),
        );
        let sync = Synchronizer::new(index).with_scroll(config.scroll);
        log::debug!("mounting hymn page '{}' with {} rows", page_key, rows.len());

        let mut page = Self {
            font_px: config.font.default_px(),
            config,
            page_key,
            store,
            elements,
            recordings,
            selected_recording: None,
            speed: None,
            visibility: BTreeMap::new(),
            sync,
        };

        if !page.recordings.is_empty() {
            page.select_recording(0, source);
        }
        if page.config.storage.persist_speed {
            if let Some(rate) = prefs::load_speed(&page.store, &page.page_key) {
                page.apply_speed(rate, source, view);
            }
        }
        page.load_languages(view);
        let px = prefs::load_font(&page.store, &page.page_key, &page.config.font);
        page.set_font(px as i64, view);

        Some(page)
    }

    pub fn page_key(&self) -> &str {
        &self.page_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn synchronizer(&self) -> &Synchronizer<usize> {
        &self.sync
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sync.active_index()
    }

    pub fn selected_recording(&self) -> Option<usize> {
        self.selected_recording
    }

    pub fn speed(&self) -> Option<f64> {
        self.speed
    }

    pub fn font_px(&self) -> u32 {
        self.font_px
    }

    pub fn visibility(&self) -> &BTreeMap<String, bool> {
        &self.visibility
    }

    /// Load recording `index` into the source at its default rate.
    ///
    /// Ignored without an audio element or recording selector, for an index
    /// out of range, or for a recording without a URL.
    pub fn select_recording<P: PlaybackSource + ?Sized>(&mut self, index: usize, source: &mut P) -> bool {
        if !self.elements.audio || !self.elements.recording_select {
            return false;
        }
        let Some(recording) = self.recordings.get(index) else {
            return false;
        };
        if recording.url.trim().is_empty() {
            return false;
        }
        source.load(&recording.url);
        source.set_playback_rate(recording.default_rate);
        self.selected_recording = Some(index);
        true
    }

    /// Apply a speed chip choice. Persisted only when speed persistence is on.
    pub fn apply_speed<P, V>(&mut self, rate: f64, source: &mut P, view: &mut V) -> bool
    where
        P: PlaybackSource + ?Sized,
        V: PageView,
    {
        if !self.elements.audio || !rate.is_finite() || rate <= 0.0 {
            return false;
        }
        source.set_playback_rate(rate);
        self.speed = Some(rate);
        if self.config.storage.persist_speed {
            if let Err(e) = prefs::save_speed(&mut self.store, &self.page_key, rate) {
                log::warn!("could not save speed for '{}': {}", self.page_key, e);
            }
        }
        let chip = self.elements.speed_chips.iter().copied().find(|chip| *chip == rate);
        view.mark_speed_chip(chip);
        true
    }

    fn load_languages<V: PageView>(&mut self, view: &mut V) {
        self.visibility = prefs::load_language_visibility(
            &self.store,
            &self.page_key,
            &self.elements.language_toggles,
        );
        for (code, visible) in &self.visibility {
            view.show_language(code, *visible);
        }
    }

    /// Set language `code` on or off and save the full mapping.
    ///
    /// Returns `None` for a code that has no toggle on this page.
    pub fn set_language<V: PageView>(&mut self, code: &str, visible: bool, view: &mut V) -> Option<bool> {
        let entry = self.visibility.get_mut(code)?;
        *entry = visible;
        view.show_language(code, visible);
        if let Err(e) = prefs::save_language_visibility(&mut self.store, &self.page_key, &self.visibility) {
            log::warn!("could not save languages for '{}': {}", self.page_key, e);
        }
        Some(visible)
    }

    /// Flip language `code`. Returns the new state.
    pub fn toggle_language<V: PageView>(&mut self, code: &str, view: &mut V) -> Option<bool> {
        let current = *self.visibility.get(code)?;
        self.set_language(code, !current, view)
    }

    /// Clamp, apply and store a font size. Returns the applied size.
    pub fn set_font<V: PageView>(&mut self, px: i64, view: &mut V) -> u32 {
        let range = self.config.font;
        let px = match prefs::save_font(&mut self.store, &self.page_key, &range, px) {
            Ok(px) => px,
            Err(e) => {
                log::warn!("could not save font for '{}': {}", self.page_key, e);
                range.clamp(px)
            }
        };
        self.font_px = px;
        view.apply_font_px(px);
        px
    }

    /// Font "+" button. `None` when the page has no font controls.
    pub fn font_plus<V: PageView>(&mut self, view: &mut V) -> Option<u32> {
        self.step_font(1, view)
    }

    /// Font "-" button. `None` when the page has no font controls.
    pub fn font_minus<V: PageView>(&mut self, view: &mut V) -> Option<u32> {
        self.step_font(-1, view)
    }

    fn step_font<V: PageView>(&mut self, delta: i64, view: &mut V) -> Option<u32> {
        if !self.elements.font_controls {
            return None;
        }
        let next = self.font_px as i64 + delta;
        Some(self.set_font(next, view))
    }

    /// Media time-progress event.
    pub fn on_time_update<P, V>(&mut self, source: &P, view: &mut V) -> bool
    where
        P: PlaybackSource + ?Sized,
        V: PageView,
    {
        if !self.elements.audio {
            return false;
        }
        self.sync.on_time_update(source, view)
    }

    /// Run one scripted interaction. Returns `false` when the page ignored it
    /// (missing element, unknown language, no highlight change).
    pub fn apply<P, V>(&mut self, action: &PageAction, source: &mut P, view: &mut V) -> bool
    where
        P: PlaybackSource + ?Sized,
        V: PageView,
    {
        match action {
            PageAction::SelectRecording(i) => self.select_recording(*i, source),
            PageAction::Speed(rate) => self.apply_speed(*rate, source, view),
            PageAction::ToggleLanguage(code) => self.toggle_language(code, view).is_some(),
            PageAction::FontPlus => self.font_plus(view).is_some(),
            PageAction::FontMinus => self.font_minus(view).is_some(),
            PageAction::Font(px) => {
                self.set_font(*px, view);
                true
            }
            PageAction::TimeUpdate { seconds } => {
                self.elements.audio && self.sync.on_time_progress(seconds_to_ms(*seconds), view)
            }
            PageAction::RowClicked(i) => self.on_row_clicked(*i, source, view).is_some(),
        }
    }

    /// Click on transcript row `index`. Ignored without an audio element.
    pub fn on_row_clicked<P, V>(&mut self, index: usize, source: &mut P, view: &mut V) -> Option<u64>
    where
        P: PlaybackSource + ?Sized,
        V: PageView,
    {
        if !self.elements.audio {
            return None;
        }
        self.sync.on_segment_clicked(index, source, view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{LyricCell, TranscriptRow};
    use crate::playback::CommandSource;
    use crate::prefs::{FontRange, MemoryStore};

    fn rows(starts: &[&str]) -> Vec<TranscriptRow> {
        starts
            .iter()
            .map(|s| TranscriptRow {
                start_attr: s.to_string(),
                display_time: String::new(),
                cells: vec![LyricCell {
                    lang: "en".to_string(),
                    text: "line".to_string(),
                    rtl: false,
                }],
            })
            .collect()
    }

    fn recordings() -> Vec<Recording> {
        vec![
            Recording {
                label: "Choir".to_string(),
                url: "/audio/choir.mp3".to_string(),
                default_rate: 0.9,
            },
            Recording {
                label: "Broken".to_string(),
                url: String::new(),
                default_rate: 1.0,
            },
        ]
    }

    fn full_page() -> PageElements {
        PageElements {
            audio: true,
            recording_select: true,
            font_controls: true,
            speed_chips: vec![0.5, 0.75, 1.0],
            language_toggles: vec![
                LanguageToggle::new("cop", false),
                LanguageToggle::new("en", true),
            ],
        }
    }

    fn mount(
        config: Config,
        store: MemoryStore,
        elements: PageElements,
        source: &mut CommandSource,
        view: &mut EffectLog,
    ) -> HymnPage<MemoryStore> {
        let rows = rows(&["0", "x", "1000", "3000"]);
        let init = PageInit {
            config,
            page_key: "/levels/a/b/c".to_string(),
            store,
            elements,
            rows: Some(&rows),
            recordings: recordings(),
        };
        HymnPage::mount(init, source, view).unwrap()
    }

    #[test]
    fn test_mount_startup_sequence() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);

        assert_eq!(
            source.drain(),
            vec![
                Effect::Load { url: "/audio/choir.mp3".to_string() },
                Effect::Rate { rate: 0.9 },
            ]
        );
        assert_eq!(
            view.drain(),
            vec![
                Effect::Language { code: "cop".to_string(), visible: false },
                Effect::Language { code: "en".to_string(), visible: true },
                Effect::Font { px: 18 },
            ]
        );
        assert_eq!(page.selected_recording(), Some(0));
        assert_eq!(page.font_px(), 18);
        assert_eq!(page.active_index(), None);
    }

    #[test]
    fn test_mount_without_table() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let init = PageInit {
            config: Config::default(),
            page_key: "/p".to_string(),
            store: MemoryStore::new(),
            elements: full_page(),
            rows: None,
            recordings: recordings(),
        };
        let page = HymnPage::mount(init, &mut source, &mut view);
        assert!(page.is_none());
        assert!(source.drain().is_empty());
        assert!(view.is_empty());
    }

    #[test]
    fn test_recording_without_url_is_skipped() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);
        source.drain();

        assert!(!page.select_recording(1, &mut source));
        assert!(!page.select_recording(7, &mut source));
        assert_eq!(page.selected_recording(), Some(0));
        assert!(source.drain().is_empty());
    }

    #[test]
    fn test_language_toggle_persists() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);

        assert_eq!(page.toggle_language("cop", &mut view), Some(true));
        assert_eq!(page.toggle_language("xx", &mut view), None);
        let store = page.store().clone();

        // A fresh mount of the same page sees the saved choice
        let page = mount(Config::default(), store, full_page(), &mut source, &mut view);
        assert_eq!(page.visibility()["cop"], true);
        assert_eq!(page.visibility()["en"], true);
    }

    #[test]
    fn test_font_buttons_clamp_and_persist() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut store = MemoryStore::new();
        store.set("font:/levels/a/b/c", "31").unwrap();
        let mut page = mount(Config::default(), store, full_page(), &mut source, &mut view);

        assert_eq!(page.font_px(), 31);
        assert_eq!(page.font_plus(&mut view), Some(32));
        assert_eq!(page.font_plus(&mut view), Some(32));
        assert_eq!(page.store().get("font:/levels/a/b/c").as_deref(), Some("32"));
        assert_eq!(page.set_font(5, &mut view), 12);
        assert_eq!(page.font_minus(&mut view), Some(12));
    }

    #[test]
    fn test_font_applied_without_controls() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let elements = PageElements {
            font_controls: false,
            ..full_page()
        };
        let mut store = MemoryStore::new();
        store.set("font:/levels/a/b/c", "24").unwrap();
        let mut page = mount(Config::default(), store, elements, &mut source, &mut view);

        assert!(view.effects().contains(&Effect::Font { px: 24 }));
        assert_eq!(page.font_plus(&mut view), None);
    }

    #[test]
    fn test_speed_not_persisted_by_default() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);
        source.drain();
        view.drain();

        assert!(page.apply_speed(0.75, &mut source, &mut view));
        assert_eq!(source.drain(), vec![Effect::Rate { rate: 0.75 }]);
        assert_eq!(view.drain(), vec![Effect::SpeedChip { rate: Some(0.75) }]);
        assert_eq!(page.store().get("speed:/levels/a/b/c"), None);
    }

    #[test]
    fn test_speed_without_chip_clears_markers() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);
        view.drain();

        page.apply_speed(0.75, &mut source, &mut view);
        assert!(page.apply_speed(1.25, &mut source, &mut view));
        assert_eq!(
            view.drain(),
            vec![
                Effect::SpeedChip { rate: Some(0.75) },
                Effect::SpeedChip { rate: None },
            ]
        );
        assert_eq!(page.speed(), Some(1.25));
    }

    #[test]
    fn test_inverted_font_range_mounts() {
        let mut config = Config::default();
        config.font = FontRange { min: 30, max: 20, default: 25 };
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(config, MemoryStore::new(), full_page(), &mut source, &mut view);
        assert_eq!(page.font_px(), 20);
        assert_eq!(page.font_plus(&mut view), Some(20));
    }

    #[test]
    fn test_speed_persisted_when_enabled() {
        let mut config = Config::default();
        config.storage.persist_speed = true;
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(config.clone(), MemoryStore::new(), full_page(), &mut source, &mut view);
        page.apply_speed(0.5, &mut source, &mut view);
        let store = page.store().clone();

        source.drain();
        let page = mount(config, store, full_page(), &mut source, &mut view);
        assert_eq!(page.speed(), Some(0.5));
        assert_eq!(
            source.drain(),
            vec![
                Effect::Load { url: "/audio/choir.mp3".to_string() },
                Effect::Rate { rate: 0.9 },
                Effect::Rate { rate: 0.5 },
            ]
        );
    }

    #[test]
    fn test_sync_through_page() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);
        view.drain();
        source.drain();

        // Row 1 has a bad start attribute and reads as 0
        source.report_position(0.5);
        assert!(page.on_time_update(&source, &mut view));
        assert_eq!(page.active_index(), Some(1));

        assert_eq!(page.on_row_clicked(3, &mut source, &mut view), Some(3000));
        assert_eq!(source.drain(), vec![Effect::Seek { seconds: 3.0 }, Effect::Play]);
        assert_eq!(page.active_index(), Some(3));
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!("font+".parse::<PageAction>().unwrap(), PageAction::FontPlus);
        assert_eq!("font=20".parse::<PageAction>().unwrap(), PageAction::Font(20));
        assert_eq!("speed=1.25".parse::<PageAction>().unwrap(), PageAction::Speed(1.25));
        assert_eq!(
            "lang=cop".parse::<PageAction>().unwrap(),
            PageAction::ToggleLanguage("cop".to_string())
        );
        assert_eq!(
            "at=0:02.5".parse::<PageAction>().unwrap(),
            PageAction::TimeUpdate { seconds: 2.5 }
        );
        assert_eq!("click=3".parse::<PageAction>().unwrap(), PageAction::RowClicked(3));
        assert!(matches!("louder".parse::<PageAction>(), Err(HymnalError::Action(_))));
        assert!(matches!("rec=x".parse::<PageAction>(), Err(HymnalError::Action(_))));
        assert!(matches!("lang=".parse::<PageAction>(), Err(HymnalError::Action(_))));
        assert!(matches!("at=1:zz".parse::<PageAction>(), Err(HymnalError::Timecode { .. })));
    }

    #[test]
    fn test_apply_actions() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let mut page = mount(Config::default(), MemoryStore::new(), full_page(), &mut source, &mut view);
        view.drain();

        assert!(page.apply(&PageAction::TimeUpdate { seconds: 1.5 }, &mut source, &mut view));
        assert_eq!(page.active_index(), Some(2));
        assert!(!page.apply(&PageAction::TimeUpdate { seconds: 1.6 }, &mut source, &mut view));
        assert!(page.apply(&PageAction::RowClicked(0), &mut source, &mut view));
        assert_eq!(page.active_index(), Some(0));
        assert!(page.apply(&PageAction::Font(40), &mut source, &mut view));
        assert_eq!(page.font_px(), 32);
        assert!(!page.apply(&PageAction::ToggleLanguage("xx".to_string()), &mut source, &mut view));
    }

    #[test]
    fn test_no_audio_element() {
        let mut source = CommandSource::new();
        let mut view = EffectLog::new();
        let elements = PageElements {
            audio: false,
            ..full_page()
        };
        let mut page = mount(Config::default(), MemoryStore::new(), elements, &mut source, &mut view);

        // Recording, speed and sync are skipped; languages and font still work
        assert!(source.drain().is_empty());
        assert_eq!(page.selected_recording(), None);
        assert_eq!(page.on_row_clicked(1, &mut source, &mut view), None);
        assert!(!page.on_time_update(&source, &mut view));
        assert!(!page.apply_speed(1.0, &mut source, &mut view));
        assert_eq!(page.toggle_language("en", &mut view), Some(false));
    }
}
