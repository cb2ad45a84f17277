use wasm_bindgen::prelude::*;
use serde::{Deserialize, Serialize};

use hymnal::playback::{CommandSource, Effect, EffectLog, ScrollBlock, ScrollOptions, SegmentIndex, Synchronizer};
use hymnal::prefs::{self, LanguageToggle, MemoryStore, Namespace, PreferenceStore};

#[derive(Serialize)]
struct BindingError {
    message: String,
}

fn to_js_error(message: impl Into<String>) -> JsValue {
    let err = BindingError {
        message: message.into(),
    };
    JsValue::from_str(&serde_json::to_string(&err).unwrap_or_else(|_| "{}".to_string()))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| to_js_error(e.to_string()))
}

fn parse_block(block: &str) -> Option<ScrollBlock> {
    match block {
        "start" => Some(ScrollBlock::Start),
        "center" => Some(ScrollBlock::Center),
        "end" => Some(ScrollBlock::End),
        "nearest" => Some(ScrollBlock::Nearest),
        _ => None,
    }
}

/// Transcript sync session for one lyrics table.
///
/// The page script forwards `timeupdate` and row clicks and applies the
/// returned effects (`highlight`, `scroll`, `seek`, `play`) in order.
#[wasm_bindgen]
pub struct LyricsSync {
    sync: Synchronizer,
    source: CommandSource,
}

#[wasm_bindgen]
impl LyricsSync {
    /// Build from the rows' start attributes, in document order. Missing or
    /// unreadable entries (null, "", "abc") count as 0.
    #[wasm_bindgen(constructor)]
    pub fn new(start_attrs: JsValue) -> Result<LyricsSync, JsValue> {
        let markers: Vec<Option<String>> =
            serde_wasm_bindgen::from_value(start_attrs).map_err(|e| to_js_error(e.to_string()))?;
        Ok(LyricsSync {
            sync: Synchronizer::new(SegmentIndex::from_markers(markers)),
            source: CommandSource::new(),
        })
    }

    /// Change how the active row is scrolled into view.
    pub fn set_scroll(&mut self, block: &str, smooth: bool) -> Result<(), JsValue> {
        let block = parse_block(block).ok_or_else(|| to_js_error(format!("unknown scroll block '{}'", block)))?;
        self.sync.set_scroll(ScrollOptions { block, smooth });
        Ok(())
    }

    /// Number of transcript rows.
    pub fn len(&self) -> usize {
        self.sync.index().len()
    }

    /// Active row, or -1 before the first update.
    pub fn active_index(&self) -> i32 {
        self.sync.state().as_raw() as i32
    }

    /// Media `timeupdate`: `seconds` is the element's `currentTime`.
    /// Returns the effects as a JSON array.
    pub fn on_time_update(&mut self, seconds: f64) -> Result<String, JsValue> {
        self.source.report_position(seconds);
        let mut view = EffectLog::new();
        self.sync.on_time_update(&self.source, &mut view);
        to_json(&view.drain())
    }

    /// Row click. Effects come back as seek, play, then highlight/scroll.
    /// The page should swallow a rejected `play()`.
    pub fn on_row_clicked(&mut self, index: usize) -> Result<String, JsValue> {
        let mut view = EffectLog::new();
        self.sync.on_segment_clicked(index, &mut self.source, &mut view);
        let mut effects: Vec<Effect> = self.source.drain();
        effects.extend(view.drain());
        to_json(&effects)
    }
}

/// Visibility flag per row/card for `query`, from a JSON array of titles.
#[wasm_bindgen]
pub fn filter(query: &str, titles_json: &str) -> Result<String, JsValue> {
    let titles: Vec<String> = serde_json::from_str(titles_json).map_err(|e| to_js_error(e.to_string()))?;
    let visible = hymnal::search::filter(query, &titles);
    to_json(&visible)
}

/// Clamp a font size into the default range.
#[wasm_bindgen]
pub fn clamp_font(px: i32) -> u32 {
    prefs::clamp_font(px as i64)
}

/// Cue time like `0:06.5` in milliseconds.
#[wasm_bindgen]
pub fn parse_timecode(t: &str) -> Result<f64, JsValue> {
    hymnal::parse_timecode(t)
        .map(|ms| ms as f64)
        .map_err(|e| to_js_error(e.to_string()))
}

/// Local storage key for a setting: `namespace` is `langs`, `font` or `speed`.
#[wasm_bindgen]
pub fn storage_key(namespace: &str, page: &str) -> Result<String, JsValue> {
    let ns = match namespace {
        "langs" => Namespace::Langs,
        "font" => Namespace::Font,
        "speed" => Namespace::Speed,
        other => return Err(to_js_error(format!("unknown namespace '{}'", other))),
    };
    Ok(prefs::storage_key(ns, page))
}

#[derive(Deserialize)]
struct ToggleInput {
    code: String,
    #[serde(default)]
    default_on: bool,
}

/// Merge a stored `langs:` value over the toggles' defaults.
///
/// `stored` is the raw local storage string (or null); `toggles` is an array
/// of `{code, default_on}`. Returns a JSON object of code to boolean.
#[wasm_bindgen]
pub fn merge_language_prefs(page: &str, stored: Option<String>, toggles: JsValue) -> Result<String, JsValue> {
    let inputs: Vec<ToggleInput> =
        serde_wasm_bindgen::from_value(toggles).map_err(|e| to_js_error(e.to_string()))?;
    let toggles: Vec<LanguageToggle> = inputs
        .into_iter()
        .map(|t| LanguageToggle::new(t.code, t.default_on))
        .collect();

    let mut store = MemoryStore::new();
    if let Some(raw) = stored {
        store
            .set(&prefs::storage_key(Namespace::Langs, page), &raw)
            .map_err(|e| to_js_error(e.to_string()))?;
    }
    to_json(&prefs::load_language_visibility(&store, page, &toggles))
}

/// Font size to apply from a stored `font:` value (or null).
#[wasm_bindgen]
pub fn load_font(page: &str, stored: Option<String>) -> Result<u32, JsValue> {
    let mut store = MemoryStore::new();
    if let Some(raw) = stored {
        store
            .set(&prefs::storage_key(Namespace::Font, page), &raw)
            .map_err(|e| to_js_error(e.to_string()))?;
    }
    Ok(prefs::load_font(&store, page, &prefs::FontRange::default()))
}
