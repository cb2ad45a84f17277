//! Segment index and active-segment lookup
//!
//! The index is built once from the page's transcript rows and never changes.
//! Lookups run on every time-progress event from the media element, so they
//! are a binary search rather than a scan.

use crate::timecode::parse_start_attr;
use super::types::Segment;

/// Immutable, document-ordered list of transcript segments.
///
/// Start times are expected to be non-decreasing. The index does not sort or
/// check this; it keeps the order it was given.
#[derive(Debug, Clone, Default)]
pub struct SegmentIndex<R = ()> {
    segments: Vec<Segment<R>>,
}

impl<R> SegmentIndex<R> {
    /// Wrap already-parsed segments.
    pub fn from_segments(segments: Vec<Segment<R>>) -> Self {
        Self { segments }
    }

    /// Build from `(start attribute, display handle)` pairs as read off the page.
    ///
    /// Each start attribute goes through [`parse_start_attr`], so missing or
    /// malformed markers become `0` instead of failing the build.
    pub fn build<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Option<S>, R)>,
        S: AsRef<str>,
    {
        let segments = rows
            .into_iter()
            .map(|(marker, display_ref)| Segment {
                start_ms: parse_start_attr(marker.as_ref().map(|m| m.as_ref())),
                display_ref,
            })
            .collect();
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment<R>> {
        self.segments.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment<R>> {
        self.segments.iter()
    }

    /// Start time of segment `index` in milliseconds.
    pub fn start_ms(&self, index: usize) -> Option<u64> {
        self.segments.get(index).map(|s| s.start_ms)
    }

    /// Index of the segment playing at `timestamp_ms`.
    ///
    /// Returns the rightmost segment whose start is `<= timestamp_ms`. When
    /// several segments share a start time the last of them wins. A timestamp
    /// before every start (including negative ones) yields `0`, as does an
    /// empty index; callers must check [`is_empty`](Self::is_empty) before
    /// using the result as a position.
    pub fn locate(&self, timestamp_ms: i64) -> usize {
        if timestamp_ms < 0 {
            return 0;
        }
        let t = timestamp_ms as u64;
        let count = self.segments.partition_point(|s| s.start_ms <= t);
        count.saturating_sub(1)
    }
}

impl SegmentIndex<()> {
    /// Build from bare start attributes, without display handles.
    pub fn from_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        Self::build(markers.into_iter().map(|m| (m, ())))
    }

    /// Build from already-numeric start times.
    pub fn from_starts(starts: &[u64]) -> Self {
        Self::from_segments(
            starts
                .iter()
                .map(|&start_ms| Segment {
                    start_ms,
                    display_ref: (),
                })
                .collect(),
        )
    }
}

/// Convert a media position in seconds to whole milliseconds for lookup.
///
/// Rounds toward negative infinity, which keeps `locate` exact against integer
/// start times. `NaN` (no media loaded) maps to `-1`, i.e. before every
/// segment.
pub fn seconds_to_ms(seconds: f64) -> i64 {
    if seconds.is_nan() {
        return -1;
    }
    (seconds * 1000.0).floor() as i64
}
