//! Range filters: cut a window out of a [`MusicData`] and rebase it to zero.
//!
//! Both filters copy; the input model is left untouched so it can be sliced
//! again. Bounds are inclusive. A lyric word survives if any of its syllables
//! does, keeping only those syllables, and takes the timing of the first one.

use crate::error::AnalysisError;
use crate::lyrics::Lyric;
use crate::music_data::MusicData;
use crate::timed::{Beat, Seconds, Timed, Timing};

/// A window over one of the two clocks.
pub trait Window {
    fn contains(&self, timing: &Timing) -> bool;
    /// Shift a retained timing so the window starts at zero.
    fn rebase(&self, timing: &mut Timing);
}

/// `[start, end]` in beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatWindow {
    pub start: Beat,
    pub end: Beat,
}

impl BeatWindow {
    pub fn new(start: Beat, end: Beat) -> Result<Self, AnalysisError> {
        if end < start {
            return Err(AnalysisError::InvalidRange {
                message: format!("beat range ends at {} before it starts at {}", end, start),
            });
        }
        Ok(Self { start, end })
    }
}

impl Window for BeatWindow {
    fn contains(&self, timing: &Timing) -> bool {
        self.start <= timing.offset && timing.offset <= self.end
    }

    fn rebase(&self, timing: &mut Timing) {
        timing.offset -= self.start;
    }
}

/// `[start, end]` in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: Seconds,
    pub end: Seconds,
}

impl TimeWindow {
    pub fn new(start: Seconds, end: Seconds) -> Result<Self, AnalysisError> {
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(AnalysisError::InvalidRange {
                message: format!("time range {}s..{}s is not a valid interval", start, end),
            });
        }
        Ok(Self { start, end })
    }
}

impl Window for TimeWindow {
    fn contains(&self, timing: &Timing) -> bool {
        timing
            .time
            .map_or(false, |time| self.start <= time && time <= self.end)
    }

    fn rebase(&self, timing: &mut Timing) {
        if let Some(time) = timing.time.as_mut() {
            *time -= self.start;
        }
    }
}

/// Keep the items of `data` whose offset lies in `[start, end]`, shifted by `-start`.
pub fn filter_beats(data: &MusicData, start: Beat, end: Beat) -> Result<MusicData, AnalysisError> {
    let window = BeatWindow::new(start, end)?;
    Ok(filter_window(data, &window))
}

/// Keep the items of `data` whose time lies in `[start, end]`, shifted by `-start`.
///
/// Fails when the model has not been through timing resolution.
pub fn filter_seconds(
    data: &MusicData,
    start: Seconds,
    end: Seconds,
) -> Result<MusicData, AnalysisError> {
    let window = TimeWindow::new(start, end)?;
    if !data.is_timed() {
        return Err(AnalysisError::InvalidRange {
            message: "time range requested before timing was resolved".to_string(),
        });
    }
    Ok(filter_window(data, &window))
}

/// Apply any window to the whole model.
pub fn filter_window(data: &MusicData, window: &impl Window) -> MusicData {
    let filtered = MusicData {
        chords: retain(&data.chords, window),
        chord_roots: retain(&data.chord_roots, window),
        notes: retain(&data.notes, window),
        notes_by_part: data
            .notes_by_part
            .iter()
            .map(|(part, notes)| (part.clone(), retain(notes, window)))
            .collect(),
        lyrics: data
            .lyrics
            .iter()
            .filter_map(|word| retain_word(&word.value, window))
            .collect(),
        keys: retain(&data.keys, window),
        bpm: data.bpm,
    };
    log::debug!(
        "range filter kept {}/{} chord(s), {}/{} note event(s)",
        filtered.chords.len(),
        data.chords.len(),
        filtered.notes.len(),
        data.notes.len()
    );
    filtered
}

fn retain<T: Clone>(items: &[Timed<T>], window: &impl Window) -> Vec<Timed<T>> {
    items
        .iter()
        .filter(|item| window.contains(&item.timing))
        .map(|item| {
            let mut item = item.clone();
            window.rebase(&mut item.timing);
            item
        })
        .collect()
}

fn retain_word(word: &Lyric, window: &impl Window) -> Option<Timed<Lyric>> {
    let syllables = retain(word, window);
    let timing = syllables.first()?.timing;
    Some(Timed {
        value: syllables,
        timing,
    })
}
