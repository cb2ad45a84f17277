use super::*;
use crate::error::PlaybackError;

/// Media element stand-in: remembers seeks and can refuse to play.
struct FakeSource {
    position: f64,
    rate: f64,
    seeks: Vec<f64>,
    play_calls: usize,
    refuse_play: bool,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            position: 0.0,
            rate: 1.0,
            seeks: Vec::new(),
            play_calls: 0,
            refuse_play: false,
        }
    }

    fn refusing() -> Self {
        Self {
            refuse_play: true,
            ..Self::new()
        }
    }
}

impl PlaybackSource for FakeSource {
    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.position = seconds;
        self.seeks.push(seconds);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn load(&mut self, _url: &str) {
        self.position = 0.0;
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        self.play_calls += 1;
        if self.refuse_play {
            Err(PlaybackError::NotAllowed("autoplay blocked".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Table stand-in: tracks which rows carry the active marker.
struct MarkerTable {
    active: Vec<bool>,
    scrolls: Vec<usize>,
}

impl MarkerTable {
    fn new(rows: usize) -> Self {
        Self {
            active: vec![false; rows],
            scrolls: Vec::new(),
        }
    }

    fn active_rows(&self) -> Vec<usize> {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, on)| **on)
            .map(|(i, _)| i)
            .collect()
    }
}

impl TranscriptView for MarkerTable {
    fn highlight(&mut self, previous: Option<usize>, next: usize) {
        if let Some(prev) = previous {
            self.active[prev] = false;
        }
        self.active[next] = true;
    }

    fn scroll_into_view(&mut self, index: usize, _options: ScrollOptions) {
        self.scrolls.push(index);
    }
}

fn sample_sync() -> Synchronizer {
    Synchronizer::new(SegmentIndex::from_starts(&[0, 1000, 2500, 2500, 4000]))
}

#[test]
fn test_initial_state_is_idle() {
    let sync = sample_sync();
    assert_eq!(sync.state(), PlaybackState::Idle);
    assert_eq!(sync.state().as_raw(), -1);
    assert_eq!(sync.active_index(), None);
}

#[test]
fn test_time_progress_activates_segment() {
    let mut sync = sample_sync();
    let mut view = EffectLog::new();

    assert!(sync.on_time_progress(2600, &mut view));
    assert_eq!(sync.state(), PlaybackState::Active(3));
    assert_eq!(
        view.drain(),
        vec![
            Effect::Highlight { previous: None, next: 3 },
            Effect::Scroll { index: 3, options: ScrollOptions::default() },
        ]
    );

    assert!(sync.on_time_progress(4100, &mut view));
    assert_eq!(
        view.effects()[0],
        Effect::Highlight { previous: Some(3), next: 4 }
    );
}

#[test]
fn test_first_tick_before_first_cue_highlights_row_zero() {
    let mut sync = Synchronizer::new(SegmentIndex::from_starts(&[5000, 9000]));
    let mut view = EffectLog::new();
    assert!(sync.on_time_progress(0, &mut view));
    assert_eq!(sync.active_index(), Some(0));
}

#[test]
fn test_repeated_ticks_are_idempotent() {
    let mut sync = sample_sync();
    let mut table = MarkerTable::new(5);

    assert!(sync.on_time_progress(1500, &mut table));
    for t in [1500, 1501, 1700, 2499] {
        assert!(!sync.on_time_progress(t, &mut table));
    }
    assert_eq!(sync.active_index(), Some(1));
    // Only the first tick scrolled
    assert_eq!(table.scrolls, vec![1]);
}

#[test]
fn test_exactly_one_active_row() {
    let mut sync = sample_sync();
    let mut table = MarkerTable::new(5);
    let mut source = FakeSource::new();

    assert!(table.active_rows().is_empty());

    for t in [0, 300, 1200, 2600, 2600, 4500] {
        sync.on_time_progress(t, &mut table);
        assert_eq!(table.active_rows().len(), 1);
    }
    sync.on_segment_clicked(0, &mut source, &mut table);
    assert_eq!(table.active_rows(), vec![0]);
    sync.on_time_progress(1000, &mut table);
    sync.on_segment_clicked(4, &mut source, &mut table);
    assert_eq!(table.active_rows(), vec![4]);
}

#[test]
fn test_monotonic_time_gives_non_decreasing_indices() {
    let mut sync = Synchronizer::new(SegmentIndex::from_starts(&[0, 0, 700, 1400, 1400, 3000]));
    let mut view = EffectLog::new();
    let mut last = 0;
    for t in (0..4000).step_by(37) {
        sync.on_time_progress(t, &mut view);
        let now = sync.active_index().unwrap();
        assert!(now >= last, "index went back from {} to {} at {}", last, now, t);
        last = now;
    }
    assert_eq!(last, 5);
}

#[test]
fn test_click_seeks_and_highlights() {
    let mut sync = sample_sync();
    let mut source = FakeSource::new();
    let mut view = EffectLog::new();

    sync.on_time_progress(4500, &mut view);
    view.drain();

    let target = sync.on_segment_clicked(2, &mut source, &mut view);
    assert_eq!(target, Some(2500));
    assert_eq!(source.seeks, vec![2.5]);
    assert_eq!(source.play_calls, 1);
    assert_eq!(sync.state(), PlaybackState::Active(2));
    assert_eq!(
        view.effects()[0],
        Effect::Highlight { previous: Some(4), next: 2 }
    );
}

#[test]
fn test_click_highlight_survives_refused_play() {
    let mut sync = sample_sync();
    let mut source = FakeSource::refusing();
    let mut view = EffectLog::new();

    assert_eq!(sync.on_segment_clicked(1, &mut source, &mut view), Some(1000));
    assert_eq!(source.play_calls, 1);
    assert_eq!(source.position, 1.0);
    assert_eq!(sync.active_index(), Some(1));
}

#[test]
fn test_click_out_of_range_is_ignored() {
    let mut sync = sample_sync();
    let mut source = FakeSource::new();
    let mut view = EffectLog::new();

    assert_eq!(sync.on_segment_clicked(9, &mut source, &mut view), None);
    assert!(source.seeks.is_empty());
    assert_eq!(source.play_calls, 0);
    assert!(view.is_empty());
    assert_eq!(sync.state(), PlaybackState::Idle);
}

#[test]
fn test_click_on_active_row_does_not_rescroll() {
    let mut sync = sample_sync();
    let mut source = FakeSource::new();
    let mut table = MarkerTable::new(5);

    sync.on_time_progress(1200, &mut table);
    sync.on_segment_clicked(1, &mut source, &mut table);
    assert_eq!(source.seeks, vec![1.0]);
    assert_eq!(table.scrolls, vec![1]);
}

#[test]
fn test_click_can_rewind_then_progress_resumes() {
    let mut sync = sample_sync();
    let mut source = FakeSource::new();
    let mut view = EffectLog::new();

    sync.on_time_progress(4200, &mut view);
    sync.on_segment_clicked(0, &mut source, &mut view);
    assert_eq!(sync.active_index(), Some(0));

    // Source reports a stale position once, then catches up
    sync.on_time_progress(4200, &mut view);
    assert_eq!(sync.active_index(), Some(4));
    sync.on_time_progress(10, &mut view);
    assert_eq!(sync.active_index(), Some(0));
}

#[test]
fn test_time_update_reads_source_position() {
    let mut sync = sample_sync();
    let mut source = FakeSource::new();
    let mut view = EffectLog::new();

    source.position = 2.7;
    assert!(sync.on_time_update(&source, &mut view));
    assert_eq!(sync.active_index(), Some(3));

    source.position = f64::NAN;
    assert!(sync.on_time_update(&source, &mut view));
    assert_eq!(sync.active_index(), Some(0));
}

#[test]
fn test_empty_transcript_stays_idle() {
    let mut sync = Synchronizer::new(SegmentIndex::from_starts(&[]));
    let mut view = EffectLog::new();
    let mut source = FakeSource::new();

    assert!(!sync.on_time_progress(1000, &mut view));
    assert_eq!(sync.on_segment_clicked(0, &mut source, &mut view), None);
    assert_eq!(sync.state(), PlaybackState::Idle);
    assert!(view.is_empty());
}

#[test]
fn test_next_state_is_pure() {
    let sync = sample_sync();
    assert_eq!(sync.next_state(2600), PlaybackState::Active(3));
    assert_eq!(sync.next_state(2600), PlaybackState::Active(3));
    assert_eq!(sync.state(), PlaybackState::Idle);
}

#[test]
fn test_custom_scroll_options() {
    let options = ScrollOptions {
        block: ScrollBlock::Nearest,
        smooth: false,
    };
    let mut sync = sample_sync().with_scroll(options);
    let mut view = EffectLog::new();
    sync.on_time_progress(0, &mut view);
    assert_eq!(view.effects()[1], Effect::Scroll { index: 0, options });
}

#[test]
fn test_effect_json_shape() {
    let effect = Effect::Highlight { previous: None, next: 2 };
    let json = serde_json::to_string(&effect).unwrap();
    assert_eq!(json, r#"{"kind":"highlight","previous":null,"next":2}"#);

    let json = serde_json::to_string(&Effect::Play).unwrap();
    assert_eq!(json, r#"{"kind":"play"}"#);
}

#[test]
fn test_command_source_records_click() {
    let mut sync = sample_sync();
    let mut source = CommandSource::new();
    let mut view = EffectLog::new();

    source.report_position(0.4);
    sync.on_time_update(&source, &mut view);
    assert_eq!(sync.on_segment_clicked(4, &mut source, &mut view), Some(4000));
    assert_eq!(source.current_time(), 4.0);
    assert_eq!(source.drain(), vec![Effect::Seek { seconds: 4.0 }, Effect::Play]);
    assert!(source.drain().is_empty());
}
