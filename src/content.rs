//! # Page Data
//!
//! The hymn catalogue as delivered to the page: languages, the level/year/hymn
//! tree, recordings and timed lyric cues.
//!
//! ## Shape
//! ```text
//! Site
//! ├── languages: [Language]
//! └── levels: [Level]
//!     └── years: [Year]
//!         └── hymns: [Hymn]
//!             ├── recordings: [Recording]
//!             └── segments: [Cue]   (one lyric line, texts per language)
//! ```
//!
//! Every field except the slugs has a default, so partially authored data
//! still loads. Cue times may be given as `start_ms`, as an authored `t`
//! (`"0:06.5"`), or both; `start_ms` wins.
//!
//! ## Example
//! ```rust
//! use hymnal::Site;
//!
//! let site = Site::from_json(r#"{
//!   "languages": [{"code": "en", "name": "English"}],
//!   "levels": [{"slug": "l1", "years": [{"slug": "y1", "hymns": [
//!     {"slug": "h1", "title": "Hymn One",
//!      "segments": [{"t": "0:02", "texts": {"en": "second"}},
//!                   {"t": "0:00", "texts": {"en": "first"}}]}
//!   ]}]}]
//! }"#).unwrap();
//!
//! let hymn = site.find_hymn_by_path("l1", "y1", "h1").unwrap();
//! // Cues are sorted by start time when the site is loaded
//! assert_eq!(hymn.segments[0].texts["en"], "first");
//! assert_eq!(hymn.segments[1].start_ms(), 2000);
//! ```

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::HymnalError;
use crate::playback::SegmentIndex;
use crate::timecode::{parse_flag, parse_leading_int, parse_timecode};

fn default_true() -> bool {
    true
}

/// Yes/no field that also takes spreadsheet-style values (`"yes"`, `"0"`, `1`).
fn read_flag<'de, D: Deserializer<'de>>(deserializer: D, default: bool) -> Result<bool, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(parse_flag(Some(&n.to_string()), default)),
        Some(Value::String(s)) => Ok(parse_flag(Some(&s), default)),
        Some(other) => Err(D::Error::custom(format!("expected a yes/no flag, found {}", other))),
    }
}

fn flag_default_on<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    read_flag(deserializer, true)
}

fn flag_default_off<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    read_flag(deserializer, false)
}

/// Millisecond start as authored: an integer, an integral float or numeric
/// text. Anything else reads as absent, so the cue falls back to its `t`.
fn lenient_start_ms<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let ms = match &value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => parse_leading_int(s).and_then(|n| u64::try_from(n).ok()),
        Some(_) => None,
    };
    if ms.is_none() {
        if let Some(raw) = value.filter(|v| !v.is_null()) {
            log::debug!("ignoring unreadable start_ms {}", raw);
        }
    }
    Ok(ms)
}

fn default_rate() -> f64 {
    1.0
}

fn default_site_title() -> String {
    "Hymns".to_string()
}

fn default_recording_label() -> String {
    "Recording".to_string()
}

fn default_cue_time() -> String {
    "0:00".to_string()
}

/// A lyric language column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flag_default_off")]
    pub is_rtl: bool,
    #[serde(default = "default_true", deserialize_with = "flag_default_on")]
    pub default_on: bool,
}

impl Language {
    /// Display name, falling back to the code.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.code
        } else {
            &self.name
        }
    }
}

/// One audio recording of a hymn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default = "default_recording_label")]
    pub label: String,
    pub url: String,
    #[serde(default = "default_rate")]
    pub default_rate: f64,
}

/// One timed lyric line with its text in each language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    #[serde(default = "default_cue_time")]
    pub t: String,
    #[serde(
        default,
        deserialize_with = "lenient_start_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_ms: Option<u64>,
    #[serde(default)]
    pub texts: BTreeMap<String, String>,
}

impl Cue {
    /// Start time in milliseconds.
    ///
    /// Uses `start_ms` when present, otherwise parses `t`. An unreadable `t`
    /// gives `0`.
    pub fn start_ms(&self) -> u64 {
        if let Some(ms) = self.start_ms {
            return ms;
        }
        match parse_timecode(&self.t) {
            Ok(ms) => ms,
            Err(e) => {
                log::debug!("cue time unreadable, using 0: {}", e);
                0
            }
        }
    }

    /// Text for `lang`, if the cue has a non-blank one.
    pub fn text(&self, lang: &str) -> Option<&str> {
        self.texts
            .get(lang)
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hymn {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub recordings: Vec<Recording>,
    #[serde(default)]
    pub segments: Vec<Cue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Year {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub hymns: Vec<Hymn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sort: i64,
    #[serde(default)]
    pub years: Vec<Year>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default = "default_site_title")]
    pub site_title: String,
    #[serde(default)]
    pub site_subtitle: String,
    #[serde(default)]
    pub footer_text: String,
    #[serde(default)]
    pub languages: Vec<Language>,
    #[serde(default)]
    pub levels: Vec<Level>,
}

/// One lyric cell of a transcript row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricCell {
    pub lang: String,
    pub text: String,
    pub rtl: bool,
}

/// A transcript row as rendered on the hymn page.
///
/// `start_attr` is the string the page puts in the row's start attribute; the
/// segment index is built from these.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRow {
    pub start_attr: String,
    pub display_time: String,
    pub cells: Vec<LyricCell>,
}

fn fill_blank(field: &mut String, slug: &str) {
    if field.trim().is_empty() {
        *field = slug.to_string();
    }
}

impl Site {
    /// Decode page data and put it in display order.
    pub fn from_json(source: &str) -> Result<Self, HymnalError> {
        let mut site: Site = serde_json::from_str(source)?;
        site.normalize();
        Ok(site)
    }

    /// Fill blank names and titles with the slug, then sort languages by
    /// code, levels/years/hymns by `(sort, name)` and each hymn's cues by start
    /// time. Sorting is stable, so equal start times keep their authored order.
    pub fn normalize(&mut self) {
        self.languages.sort_by(|a, b| a.code.cmp(&b.code));
        for level in &mut self.levels {
            fill_blank(&mut level.name, &level.slug);
            for year in &mut level.years {
                fill_blank(&mut year.name, &year.slug);
                for hymn in &mut year.hymns {
                    fill_blank(&mut hymn.title, &hymn.slug);
                }
            }
        }

        self.levels.sort_by(|a, b| (a.sort, &a.name).cmp(&(b.sort, &b.name)));
        for level in &mut self.levels {
            level.years.sort_by(|a, b| (a.sort, &a.name).cmp(&(b.sort, &b.name)));
            for year in &mut level.years {
                year.hymns.sort_by(|a, b| (a.sort, &a.title).cmp(&(b.sort, &b.title)));
                for hymn in &mut year.hymns {
                    hymn.segments.sort_by_key(|cue| cue.start_ms());
                }
            }
        }
    }

    pub fn find_level(&self, slug: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.slug == slug)
    }

    pub fn find_hymn_by_path(&self, level: &str, year: &str, hymn: &str) -> Option<&Hymn> {
        self.find_level(level)?.find_year(year)?.find_hymn(hymn)
    }

    /// Resolve a `level/year/hymn` path, reporting which part is missing.
    pub fn resolve(&self, path: &str) -> Result<&Hymn, HymnalError> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        let [level_slug, year_slug, hymn_slug] = parts.as_slice() else {
            return Err(HymnalError::NotFound(format!(
                "'{}' is not a level/year/hymn path",
                path
            )));
        };
        let level = self
            .find_level(level_slug)
            .ok_or_else(|| HymnalError::NotFound(format!("level '{}'", level_slug)))?;
        let year = level
            .find_year(year_slug)
            .ok_or_else(|| HymnalError::NotFound(format!("year '{}'", year_slug)))?;
        year.find_hymn(hymn_slug)
            .ok_or_else(|| HymnalError::NotFound(format!("hymn '{}'", hymn_slug)))
    }

    /// Every hymn in display order.
    pub fn hymns(&self) -> impl Iterator<Item = &Hymn> {
        self.levels
            .iter()
            .flat_map(|l| l.years.iter())
            .flat_map(|y| y.hymns.iter())
    }

    pub fn language(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }
}

impl Level {
    pub fn find_year(&self, slug: &str) -> Option<&Year> {
        self.years.iter().find(|y| y.slug == slug)
    }
}

impl Year {
    pub fn find_hymn(&self, slug: &str) -> Option<&Hymn> {
        self.hymns.iter().find(|h| h.slug == slug)
    }
}

impl Hymn {
    /// Transcript rows in cue order, with a cell for each of `languages` that
    /// the cue has text for.
    pub fn rows(&self, languages: &[Language]) -> Vec<TranscriptRow> {
        self.segments
            .iter()
            .map(|cue| TranscriptRow {
                start_attr: cue.start_ms().to_string(),
                display_time: cue.t.clone(),
                cells: languages
                    .iter()
                    .filter_map(|lang| {
                        cue.text(&lang.code).map(|text| LyricCell {
                            lang: lang.code.clone(),
                            text: text.to_string(),
                            rtl: lang.is_rtl,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    /// Segment index over this hymn's cues, keyed by cue position.
    pub fn segment_index(&self) -> SegmentIndex<usize> {
        SegmentIndex::build(
            self.segments
                .iter()
                .enumerate()
                .map(|(i, cue)| (Some(cue.start_ms().to_string()), i)),
        )
    }
}
