//! # Page Preferences
//!
//! Per-page display settings that survive a reload: which lyric languages are
//! shown, the lyric font size and (optionally) the playback speed.
//!
//! ## Storage layout
//! The store is a flat string key/value space, shaped like browser local
//! storage. Each setting lives under `"<namespace>:<page>"`:
//! - `langs:<page>` - JSON object, language code to boolean
//! - `font:<page>` - integer pixel size as text
//! - `speed:<page>` - float playback rate as text (only when enabled)
//!
//! Nothing stored here is ever surfaced as an error on read. A value that is
//! missing or does not parse reads as "nothing saved" and the caller's
//! defaults apply.
//!
//! ## Example
//! ```rust
//! use hymnal::prefs::{self, LanguageToggle, MemoryStore};
//!
//! let mut store = MemoryStore::new();
//! let toggles = vec![
//!     LanguageToggle::new("en", true),
//!     LanguageToggle::new("cop", false),
//! ];
//!
//! let mut visible = prefs::load_language_visibility(&store, "/hymns/1", &toggles);
//! assert_eq!(visible["cop"], false);
//!
//! visible.insert("cop".to_string(), true);
//! prefs::save_language_visibility(&mut store, "/hymns/1", &visible).unwrap();
//!
//! let visible = prefs::load_language_visibility(&store, "/hymns/1", &toggles);
//! assert_eq!(visible["cop"], true);
//! assert_eq!(visible["en"], true);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::error::HymnalError;
use crate::timecode::parse_leading_int;

/// String key/value persistence.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), HymnalError>;
}

/// Setting bucket, the first half of a storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Langs,
    Font,
    Speed,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Langs => "langs",
            Namespace::Font => "font",
            Namespace::Speed => "speed",
        }
    }
}

/// Full storage key for a setting of `page`.
pub fn storage_key(namespace: Namespace, page: &str) -> String {
    format!("{}:{}", namespace.prefix(), page)
}

/// Where the page identity used in storage keys comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageKeySource {
    /// Identifier supplied with the page data (`"default"` when absent)
    Identifier,
    /// The page's URL path
    #[default]
    Path,
}

/// Page key used when the page data carries no identifier.
pub const DEFAULT_PAGE_KEY: &str = "default";

/// Derive the page identity for storage keys.
pub fn page_key(source: PageKeySource, identifier: Option<&str>, path: &str) -> String {
    match source {
        PageKeySource::Identifier => identifier
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_PAGE_KEY)
            .to_string(),
        PageKeySource::Path => path.to_string(),
    }
}

/// Read a JSON-object setting.
///
/// Absent, malformed or non-object values read as an empty map.
pub fn load<S: PreferenceStore + ?Sized>(store: &S, page: &str, namespace: Namespace) -> Map<String, Value> {
    let key = storage_key(namespace, page);
    let Some(raw) = store.get(&key) else {
        return Map::new();
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            log::debug!("{} holds {} instead of an object, ignoring", key, other);
            Map::new()
        }
        Err(e) => {
            log::debug!("{} is not valid JSON, ignoring: {}", key, e);
            Map::new()
        }
    }
}

/// Write a JSON-object setting, replacing whatever was stored.
pub fn save<S: PreferenceStore + ?Sized>(
    store: &mut S,
    page: &str,
    namespace: Namespace,
    values: &Map<String, Value>,
) -> Result<(), HymnalError> {
    let encoded = serde_json::to_string(values)?;
    store.set(&storage_key(namespace, page), &encoded)
}

/// A language checkbox with its page-declared default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageToggle {
    pub code: String,
    pub default_on: bool,
}

impl LanguageToggle {
    pub fn new(code: impl Into<String>, default_on: bool) -> Self {
        Self {
            code: code.into(),
            default_on,
        }
    }
}

/// Saved language choices merged over each toggle's default.
///
/// Only codes present in `toggles` appear in the result. A saved value that is
/// not a boolean counts by its truthiness (`0`, `""` and `null` are off).
pub fn load_language_visibility<S: PreferenceStore + ?Sized>(
    store: &S,
    page: &str,
    toggles: &[LanguageToggle],
) -> BTreeMap<String, bool> {
    let saved = load(store, page, Namespace::Langs);
    toggles
        .iter()
        .map(|t| {
            let on = saved.get(&t.code).map(json_truthy).unwrap_or(t.default_on);
            (t.code.clone(), on)
        })
        .collect()
}

/// Store the full language mapping for `page`.
pub fn save_language_visibility<S: PreferenceStore + ?Sized>(
    store: &mut S,
    page: &str,
    visibility: &BTreeMap<String, bool>,
) -> Result<(), HymnalError> {
    let values: Map<String, Value> = visibility
        .iter()
        .map(|(code, on)| (code.clone(), Value::Bool(*on)))
        .collect();
    save(store, page, Namespace::Langs, &values)
}

fn json_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Allowed lyric font sizes in pixels, and the size used when nothing is saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontRange {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

impl Default for FontRange {
    fn default() -> Self {
        Self {
            min: 12,
            max: 32,
            default: 18,
        }
    }
}

impl FontRange {
    /// Clamp a requested size into the range.
    ///
    /// An inverted range (`min > max`) never panics; `max` wins.
    pub fn clamp(&self, px: i64) -> u32 {
        px.max(self.min as i64).min(self.max as i64) as u32
    }

    /// The default size, clamped into the range.
    pub fn default_px(&self) -> u32 {
        self.clamp(self.default as i64)
    }

    /// Size one step away from `current`, clamped.
    pub fn step(&self, current: u32, delta: i64) -> u32 {
        self.clamp(current as i64 + delta)
    }
}

/// Clamp into the default `[12, 32]` range.
pub fn clamp_font(px: i64) -> u32 {
    FontRange::default().clamp(px)
}

/// Saved font size for `page`, clamped; the clamped `range.default` when
/// nothing readable is stored.
pub fn load_font<S: PreferenceStore + ?Sized>(store: &S, page: &str, range: &FontRange) -> u32 {
    let stored = store
        .get(&storage_key(Namespace::Font, page))
        .and_then(|raw| parse_leading_int(&raw));
    match stored {
        Some(px) => range.clamp(px),
        None => range.default_px(),
    }
}

/// Clamp and store a font size. Returns the value actually stored.
pub fn save_font<S: PreferenceStore + ?Sized>(
    store: &mut S,
    page: &str,
    range: &FontRange,
    px: i64,
) -> Result<u32, HymnalError> {
    let px = range.clamp(px);
    store.set(&storage_key(Namespace::Font, page), &px.to_string())?;
    Ok(px)
}

/// Saved playback rate for `page`, if a positive finite one is stored.
pub fn load_speed<S: PreferenceStore + ?Sized>(store: &S, page: &str) -> Option<f64> {
    store
        .get(&storage_key(Namespace::Speed, page))
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}

pub fn save_speed<S: PreferenceStore + ?Sized>(store: &mut S, page: &str, rate: f64) -> Result<(), HymnalError> {
    store.set(&storage_key(Namespace::Speed, page), &rate.to_string())
}

/// In-memory store, for tests and for hosts without persistence.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HymnalError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store kept as one JSON object in a file, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file starts empty. A file that cannot be read or decoded is
    /// logged and also starts empty; it is overwritten on the next `set`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("preference file {:?} is invalid, starting empty: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("preference file {:?} unreadable, starting empty: {}", path, e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HymnalError> {
        self.entries.insert(key.to_string(), value.to_string());
        let encoded = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, encoded)
            .map_err(|e| HymnalError::Storage(format!("{}: {}", self.path.display(), e)))
    }
}
